//! # Brace Expansion Module / 花括号展开模块
//!
//! Turns the shorthand used in environment lists (`py{36,37,38}`) into an
//! explicit, ordered sequence of identifiers. Expansion happens once while the
//! configuration is loaded; nothing is re-evaluated during execution.
//!
//! 将环境列表中使用的简写（`py{36,37,38}`）转换为明确的有序标识符序列。
//! 展开只在加载配置时进行一次；执行期间不会重新求值。

use crate::core::error::ConfigError;

/// Splits a comma separated list at the top level, leaving commas inside
/// braces untouched. Items are trimmed and empty items are dropped.
///
/// 在顶层按逗号拆分列表，花括号内的逗号保持不变。
/// 每一项都会去除首尾空白，空项会被丢弃。
pub fn split_list(input: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in input.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' | '\n' if depth == 0 => {
                push_trimmed(&mut items, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_trimmed(&mut items, &current);
    items
}

fn push_trimmed(items: &mut Vec<String>, item: &str) {
    let item = item.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

/// Expands every brace group in `pattern` into the cartesian product of its
/// alternatives, in left-to-right order.
///
/// `py{37,38}-django{2,3}` becomes `py37-django2`, `py37-django3`,
/// `py38-django2`, `py38-django3`. Nested or unbalanced braces are rejected,
/// as is any alternative that leaves an empty identifier.
///
/// 将 `pattern` 中的每个花括号组展开为其候选项的笛卡尔积（从左到右）。
/// 嵌套或不平衡的花括号，以及产生空标识符的候选项，都会被拒绝。
pub fn expand_braces(pattern: &str) -> Result<Vec<String>, ConfigError> {
    let invalid = |reason: &str| ConfigError::Pattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut results = vec![String::new()];
    let mut rest = pattern;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                append_literal(&mut results, rest);
                break;
            }
            Some(pos) if rest[pos..].starts_with('}') => {
                return Err(invalid("unexpected '}'"));
            }
            Some(open) => {
                append_literal(&mut results, &rest[..open]);
                let group = &rest[open + 1..];
                let close = group
                    .find(['{', '}'])
                    .filter(|&i| group[i..].starts_with('}'))
                    .ok_or_else(|| {
                        if group.contains('}') {
                            invalid("nested braces are not supported")
                        } else {
                            invalid("unclosed '{'")
                        }
                    })?;

                let alternatives: Vec<&str> = group[..close].split(',').map(str::trim).collect();
                results = results
                    .iter()
                    .flat_map(|prefix| alternatives.iter().map(move |alt| format!("{prefix}{alt}")))
                    .collect();
                rest = &group[close + 1..];
            }
        }
    }

    if results.iter().any(|r| r.trim().is_empty()) {
        return Err(invalid("expands to an empty identifier"));
    }
    Ok(results)
}

fn append_literal(results: &mut [String], literal: &str) {
    for result in results.iter_mut() {
        result.push_str(literal);
    }
}

/// Splits a list and expands each item, preserving order.
/// 拆分列表并展开每一项，保持顺序。
pub fn expand_list<S: AsRef<str>>(items: &[S]) -> Result<Vec<String>, ConfigError> {
    let mut expanded = Vec::new();
    for item in items {
        for part in split_list(item.as_ref()) {
            expanded.extend(expand_braces(&part)?);
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_keeps_commas_inside_braces() {
        assert_eq!(
            split_list("py{36,37,38}, quality"),
            vec!["py{36,37,38}", "quality"]
        );
    }

    #[test]
    fn literal_without_braces_is_unchanged() {
        assert_eq!(expand_braces("quality").unwrap(), vec!["quality"]);
    }

    #[test]
    fn unexpected_closing_brace_is_rejected() {
        assert!(matches!(
            expand_braces("py36}"),
            Err(ConfigError::Pattern { .. })
        ));
    }
}

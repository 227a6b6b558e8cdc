//! # Command Template Module / 命令模板模块
//!
//! Commands, install commands and create commands are templates. Rendering
//! one substitutes `{placeholders}`, expands the template's own `$VAR`
//! references against the context's environment and splits the line
//! shell-style into argv. Nothing is handed to a shell.
//!
//! 命令、安装命令和创建命令都是模板。渲染时替换 `{占位符}`，
//! 依据上下文环境展开模板自身的 `$VAR` 引用，并按 shell 规则拆分为 argv。
//! 不会交给 shell 执行。

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced quotes in `{0}`")]
    UnbalancedQuotes(String),

    #[error("command is empty after substitution: `{0}`")]
    Empty(String),

    #[error("argument contains a NUL byte in `{0}`")]
    Quote(String),
}

/// Values available to `{placeholder}` substitution.
/// 可用于 `{占位符}` 替换的值。
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub envname: &'a str,
    pub envdir: &'a Path,
    pub envbindir: &'a Path,
    pub envtmpdir: &'a Path,
    pub rootdir: &'a Path,
    pub interpreter: Option<&'a Path>,
    pub posargs: &'a [String],
    pub packages: &'a [String],
}

impl Placeholders<'_> {
    fn lookup(&self, key: &str, source: &str) -> Result<Option<String>, TemplateError> {
        let value = match key {
            "envname" => quote_one(self.envname, source)?,
            "envdir" => quote_path(self.envdir, source)?,
            "envbindir" => quote_path(self.envbindir, source)?,
            "envtmpdir" => quote_path(self.envtmpdir, source)?,
            "rootdir" => quote_path(self.rootdir, source)?,
            "interpreter" => match self.interpreter {
                Some(path) => quote_path(path, source)?,
                None => return Ok(None),
            },
            "packages" => quote_all(self.packages, source)?,
            "posargs" => quote_all(self.posargs, source)?,
            _ => match key.strip_prefix("posargs:") {
                Some(default) if self.posargs.is_empty() => default.to_string(),
                Some(_) => quote_all(self.posargs, source)?,
                None => return Ok(None),
            },
        };
        Ok(Some(value))
    }
}

fn quote_one(value: &str, source: &str) -> Result<String, TemplateError> {
    shlex::try_quote(value)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| TemplateError::Quote(source.to_string()))
}

fn quote_path(path: &Path, source: &str) -> Result<String, TemplateError> {
    quote_one(&path.to_string_lossy(), source)
}

fn quote_all(values: &[String], source: &str) -> Result<String, TemplateError> {
    shlex::try_join(values.iter().map(String::as_str))
        .map_err(|_| TemplateError::Quote(source.to_string()))
}

/// Renders a template into one command line. Known `{placeholders}` are
/// replaced by their shell-quoted values; unknown `{...}` text is kept as is.
/// `$VAR` and `${VAR}` written in the template expand against `env`, except
/// inside single quotes. Substituted values are never expanded.
///
/// 将模板渲染为一行命令。已知的 `{占位符}` 被替换为经过 shell 引用的值；
/// 未知的 `{...}` 文本保持原样。模板中的 `$VAR` 和 `${VAR}` 依据 `env` 展开，
/// 单引号内除外。替换进来的值永远不会被展开。
pub fn render_line(
    template: &str,
    values: &Placeholders<'_>,
    env: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    // Template text still subject to `$VAR` expansion.
    let mut pending = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        let mut step = c.len_utf8();
        match c {
            '{' => {
                let after = &rest[1..];
                let known = match after.find('}') {
                    Some(close) => values.lookup(&after[..close], template)?.map(|v| (v, close)),
                    None => None,
                };
                match known {
                    Some((value, close)) => {
                        flush_vars(&mut pending, &mut out, env);
                        out.push_str(&value);
                        step = close + 2;
                    }
                    None if in_single => out.push(c),
                    None => pending.push(c),
                }
            }
            '\'' if !in_double => {
                flush_vars(&mut pending, &mut out, env);
                out.push(c);
                in_single = !in_single;
            }
            '"' if !in_single => {
                in_double = !in_double;
                pending.push(c);
            }
            '\\' if !in_single => {
                pending.push(c);
                if let Some(next) = rest[step..].chars().next() {
                    pending.push(next);
                    step += next.len_utf8();
                }
            }
            _ if in_single => out.push(c),
            _ => pending.push(c),
        }
        rest = &rest[step..];
    }
    flush_vars(&mut pending, &mut out, env);
    Ok(out)
}

fn flush_vars(pending: &mut String, out: &mut String, env: &BTreeMap<String, String>) {
    if pending.is_empty() {
        return;
    }
    out.push_str(&shellexpand::env_with_context_no_errors(pending.as_str(), |name: &str| {
        env.get(name)
    }));
    pending.clear();
}

/// Renders a template into argv: [`render_line`], then shell-style splitting.
///
/// 将模板渲染为 argv：先执行 [`render_line`]，再按 shell 规则拆分。
pub fn render_argv(
    template: &str,
    values: &Placeholders<'_>,
    env: &BTreeMap<String, String>,
) -> Result<Vec<String>, TemplateError> {
    let line = render_line(template, values, env)?;
    let argv = shlex::split(&line)
        .ok_or_else(|| TemplateError::UnbalancedQuotes(template.to_string()))?;
    if argv.is_empty() {
        return Err(TemplateError::Empty(template.to_string()));
    }
    Ok(argv)
}

/// Returns `true` when a template expands to nothing without placeholders,
/// i.e. the step is disabled.
pub fn is_blank(template: &str) -> bool {
    template.trim().is_empty()
}

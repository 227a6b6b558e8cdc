//! # Environment Variable Module / 环境变量模块
//!
//! Captures the invoking process's variables once, as an immutable snapshot,
//! and derives from it the exact variable set each context sees. Only names
//! matching a pass-through pattern (plus a small base set needed to launch
//! processes at all) are inherited.
//!
//! 一次性捕获调用进程的变量作为不可变快照，并由此推导每个上下文所见的
//! 确切变量集。只有匹配透传模式的变量（以及启动进程所需的少量基础变量）会被继承。

use std::collections::BTreeMap;
use std::path::Path;

/// Variables every context inherits regardless of `passenv`.
/// 无论 `passenv` 如何，每个上下文都会继承的变量。
pub const BASE_PASSENV: &[&str] = &[
    "PATH",
    "LANG",
    "LANGUAGE",
    "LC_*",
    "LD_LIBRARY_PATH",
    "TMPDIR",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "PIP_INDEX_URL",
    "PIP_EXTRA_INDEX_URL",
    "REQUESTS_CA_BUNDLE",
    "SSL_CERT_FILE",
    // Windows cannot start most programs without these.
    "SYSTEMDRIVE",
    "SYSTEMROOT",
    "COMSPEC",
    "PATHEXT",
    "TEMP",
    "TMP",
    "USERPROFILE",
];

/// Name of the variable holding the environment identifier inside a context.
pub const ENV_NAME_VAR: &str = "ENV_MATRIX_ENV_NAME";
/// Name of the variable holding the context directory inside a context.
pub const ENV_DIR_VAR: &str = "ENV_MATRIX_ENV_DIR";

/// An immutable copy of the invoker's environment.
/// 调用者环境的不可变副本。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment. Variables that are not
    /// valid unicode are skipped.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Variables whose names match any of `patterns` or the base set.
    /// 名称匹配任一 `patterns` 或基础集合的变量。
    pub fn filtered<S: AsRef<str>>(&self, patterns: &[S]) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter(|(name, _)| {
                BASE_PASSENV.iter().any(|p| pattern_matches(p, name))
                    || patterns.iter().any(|p| pattern_matches(p.as_ref(), name))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Matches a variable name against a pattern where `*` stands for any run of
/// characters. Names compare case-insensitively on Windows.
///
/// 将变量名与模式匹配，其中 `*` 代表任意字符序列。Windows 上不区分大小写。
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let (pattern, name) = if cfg!(windows) {
        (pattern.to_ascii_uppercase(), name.to_ascii_uppercase())
    } else {
        (pattern.to_string(), name.to_string())
    };

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    if !name.starts_with(first) {
        return false;
    }
    let mut rest = &name[first.len()..];
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No wildcard at all: exact match.
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// Builds the complete variable set of one context.
///
/// Order of precedence, lowest first: pass-through variables, the context
/// markers (`VIRTUAL_ENV`, `ENV_MATRIX_*`, `PATH` prefixed with the context's
/// bin directory), then `setenv`.
///
/// 构建单个上下文的完整变量集。优先级从低到高：透传变量、上下文标记
/// （`VIRTUAL_ENV`、`ENV_MATRIX_*`、以上下文 bin 目录为前缀的 `PATH`），最后是 `setenv`。
pub fn context_environment(
    snapshot: &EnvSnapshot,
    passenv: &[String],
    setenv: &BTreeMap<String, String>,
    env_name: &str,
    envdir: &Path,
    envbindir: &Path,
) -> BTreeMap<String, String> {
    let mut vars = snapshot.filtered(passenv);

    let bindir = envbindir.to_string_lossy().into_owned();
    let path = match vars.get("PATH") {
        Some(existing) if !existing.is_empty() => {
            let separator = if cfg!(windows) { ";" } else { ":" };
            format!("{bindir}{separator}{existing}")
        }
        _ => bindir,
    };
    vars.insert("PATH".to_string(), path);
    vars.insert("VIRTUAL_ENV".to_string(), envdir.to_string_lossy().into_owned());
    vars.insert(ENV_NAME_VAR.to_string(), env_name.to_string());
    vars.insert(ENV_DIR_VAR.to_string(), envdir.to_string_lossy().into_owned());

    for (key, value) in setenv {
        let expanded = shellexpand::env_with_context_no_errors(value, |name: &str| vars.get(name));
        let expanded = expanded.into_owned();
        vars.insert(key.clone(), expanded);
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_suffix() {
        assert!(pattern_matches("TRAVIS_*", "TRAVIS_BRANCH"));
        assert!(!pattern_matches("TRAVIS_*", "TRAVIS"));
        assert!(pattern_matches("TRAVIS", "TRAVIS"));
        assert!(!pattern_matches("TRAVIS", "TRAVIS_BRANCH"));
    }

    #[test]
    fn wildcard_in_the_middle() {
        assert!(pattern_matches("A*_TOKEN", "API_TOKEN"));
        assert!(!pattern_matches("A*_TOKEN", "API_TOKENS"));
        assert!(pattern_matches("*", "ANYTHING"));
    }
}

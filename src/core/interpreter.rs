//! # Interpreter Selection Module / 解释器选择模块
//!
//! An interpreter selector names the interpreter an environment runs on. It
//! can be a bare version (`3.7`), a tag (`py37`, `pypy3`) or an executable
//! name or path. Resolution maps the selector to candidate executable names
//! and looks them up on the invoker's `PATH`.
//!
//! 解释器选择器指定环境运行所用的解释器。它可以是版本号（`3.7`）、
//! 标签（`py37`、`pypy3`）或可执行文件名/路径。解析时会将选择器映射为候选
//! 可执行文件名，并在调用者的 `PATH` 中查找。

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::core::error::EnvError;

/// Fallback used when neither the environment, its name nor the shared
/// defaults pick an interpreter.
pub const DEFAULT_INTERPRETER: &str = "python3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InterpreterSelector {
    /// A dotted version such as `3.7` or `3`.
    Version(String),
    /// A short tag such as `py37`, `py3`, `py` or `pypy38`.
    Tag(String),
    /// Anything else: an executable name or a path, used verbatim.
    Executable(String),
}

impl InterpreterSelector {
    /// Classifies a selector string.
    /// 对选择器字符串进行分类。
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if is_version(raw) {
            InterpreterSelector::Version(raw.to_string())
        } else if split_tag(raw).is_some() {
            InterpreterSelector::Tag(raw.to_string())
        } else {
            InterpreterSelector::Executable(raw.to_string())
        }
    }

    /// Derives a selector from the first factor of an environment name that
    /// looks like a tag (`py38-lint` gives `py38`).
    ///
    /// 从环境名称中第一个形如标签的因子推导选择器（`py38-lint` 得到 `py38`）。
    pub fn from_env_name(name: &str) -> Option<Self> {
        name.split('-')
            .find(|factor| split_tag(factor).is_some())
            .map(|factor| InterpreterSelector::Tag(factor.to_string()))
    }

    /// The executable names to try, in order.
    /// 按顺序尝试的可执行文件名。
    pub fn candidates(&self) -> Vec<String> {
        match self {
            InterpreterSelector::Version(version) => vec![format!("python{version}")],
            InterpreterSelector::Tag(tag) => {
                let Some((family, digits)) = split_tag(tag) else {
                    return vec![tag.clone()];
                };
                let base = if family == "py" { "python" } else { "pypy" };
                match digits.len() {
                    0 | 1 => vec![format!("{base}{digits}")],
                    _ => {
                        let (major, minor) = digits.split_at(1);
                        vec![format!("{base}{major}.{minor}")]
                    }
                }
            }
            InterpreterSelector::Executable(exe) => vec![exe.clone()],
        }
    }

    /// Looks up the first candidate that exists on `PATH` (or as a path).
    /// 查找 `PATH` 中（或作为路径）存在的第一个候选项。
    pub fn resolve(&self) -> Result<PathBuf, EnvError> {
        let candidates = self.candidates();
        for candidate in &candidates {
            match which::which(candidate) {
                Ok(path) => {
                    tracing::debug!(selector = %self, path = %path.display(), "resolved interpreter");
                    return Ok(path);
                }
                Err(e) => {
                    tracing::debug!(selector = %self, candidate = %candidate, error = %e, "interpreter candidate not found");
                }
            }
        }
        Err(EnvError::InterpreterNotFound {
            selector: self.to_string(),
            tried: candidates,
        })
    }
}

impl fmt::Display for InterpreterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpreterSelector::Version(s)
            | InterpreterSelector::Tag(s)
            | InterpreterSelector::Executable(s) => f.write_str(s),
        }
    }
}

fn is_version(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Splits `py37` into (`py`, `37`) and `pypy3` into (`pypy`, `3`).
fn split_tag(raw: &str) -> Option<(&'static str, &str)> {
    let (family, digits) = if let Some(rest) = raw.strip_prefix("pypy") {
        ("pypy", rest)
    } else if let Some(rest) = raw.strip_prefix("py") {
        ("py", rest)
    } else {
        return None;
    };
    digits
        .chars()
        .all(|c| c.is_ascii_digit())
        .then_some((family, digits))
}

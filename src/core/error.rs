//! # Error Taxonomy Module / 错误分类模块
//!
//! Fatal errors (`ConfigError`, `MatrixError`) abort an invocation before any
//! environment runs. `EnvError` describes why a single environment did not
//! pass; it is stored in that environment's `RunResult` and never stops its
//! siblings.
//!
//! 致命错误（`ConfigError`、`MatrixError`）会在任何环境运行之前中止调用。
//! `EnvError` 描述单个环境未通过的原因；它存储在该环境的 `RunResult` 中，
//! 不会中断其他环境。

use serde::Serialize;
use thiserror::Error;

/// A malformed or self-inconsistent matrix configuration.
/// 格式错误或自相矛盾的矩阵配置。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse matrix configuration: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("no environments are declared in [matrix].envs")]
    NoEnvironments,

    #[error("environment '{0}' is declared more than once")]
    DuplicateEnvironment(String),

    #[error("section [env.{0}] does not belong to any declared environment")]
    UndeclaredSection(String),

    #[error("default run list references undefined environment '{0}'")]
    UndefinedEnvironment(String),

    #[error("environment '{env}': invalid value for '{field}': {reason}")]
    InvalidValue {
        env: String,
        field: &'static str,
        reason: String,
    },
}

/// Errors that abort a matrix run before any environment is started.
/// 在任何环境启动之前中止矩阵运行的错误。
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown environment(s): {}", .0.join(", "))]
    UnknownEnvironment(Vec<String>),
}

/// The reason a single environment ended up Failed, Errored or Skipped.
/// 单个环境最终为 Failed、Errored 或 Skipped 的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvError {
    #[error("interpreter '{selector}' not found (tried: {})", .tried.join(", "))]
    InterpreterNotFound { selector: String, tried: Vec<String> },

    #[error("failed to create isolated context: {reason}")]
    ContextCreation { reason: String },

    #[error("dependency installation failed: {reason}")]
    DependencyInstall { reason: String },

    #[error("command `{command}` failed with {}", describe_exit(.code))]
    CommandFailure { command: String, code: Option<i32> },

    #[error("command `{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    #[error("interrupted before the environment finished")]
    Cancelled,

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code".to_string(),
    }
}

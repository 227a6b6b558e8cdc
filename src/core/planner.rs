//! # Execution Planner Module / 执行计划模块
//!
//! Turns a selection (default run list, `ALL`, or explicit identifiers) into
//! the ordered list of environments to run. Selections are validated against
//! the declared matrix before anything is executed.
//!
//! 将选择（默认运行列表、`ALL` 或明确的标识符）转换为要运行的有序环境列表。
//! 在执行任何操作之前，会根据已声明的矩阵验证选择。

use crate::core::config::{EnvironmentSpec, MatrixConfig};
use crate::core::error::{ConfigError, MatrixError};
use crate::core::expand;

/// Keyword selecting every declared environment.
pub const ALL_KEYWORD: &str = "ALL";

/// Which environments to run.
/// 要运行哪些环境。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// The default run list (`envlist`).
    #[default]
    Default,
    /// Every declared environment.
    All,
    /// An explicit list of declared identifiers. `ALL` in the list selects
    /// everything once the other names are known to be declared.
    Only(Vec<String>),
}

impl Selection {
    /// Builds a selection from `-e` values. Each value may be a comma
    /// separated list and may use brace shorthand; `ALL` selects everything.
    /// No values select the default run list.
    ///
    /// 由 `-e` 参数值构建选择。每个值可以是逗号分隔的列表，也可以使用花括号简写；
    /// `ALL` 选择全部环境。没有值时选择默认运行列表。
    pub fn from_args<S: AsRef<str>>(values: &[S]) -> Result<Self, ConfigError> {
        let names = expand::expand_list(values)?;
        if names.is_empty() {
            Ok(Selection::Default)
        } else if names.iter().all(|n| n == ALL_KEYWORD) {
            Ok(Selection::All)
        } else {
            // `ALL` mixed with other names stays explicit so the others
            // are still checked against the matrix.
            Ok(Selection::Only(names))
        }
    }
}

/// The environments selected for one invocation.
/// 为单次调用选定的环境。
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Environments to run, in declared order / 要运行的环境，按声明顺序
    pub environments: Vec<EnvironmentSpec>,
    /// Declared environments that were not selected / 未被选中的已声明环境数量
    pub excluded_count: usize,
}

impl ExecutionPlan {
    pub fn names(&self) -> Vec<&str> {
        self.environments.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

/// Creates the execution plan for `selection`.
///
/// # Errors
/// `MatrixError::UnknownEnvironment` if the selection names identifiers that
/// are not declared.
///
/// 为 `selection` 创建执行计划。如果选择中包含未声明的标识符，
/// 返回 `MatrixError::UnknownEnvironment`。
pub fn plan_execution(
    config: &MatrixConfig,
    selection: &Selection,
) -> Result<ExecutionPlan, MatrixError> {
    let environments: Vec<EnvironmentSpec> = match selection {
        Selection::All => config.environments.clone(),
        Selection::Default => config
            .environments
            .iter()
            .filter(|env| env.in_default_run)
            .cloned()
            .collect(),
        Selection::Only(names) => {
            let mut unknown: Vec<String> = names
                .iter()
                .filter(|name| *name != ALL_KEYWORD && !config.contains(name))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                unknown.dedup();
                return Err(MatrixError::UnknownEnvironment(unknown));
            }
            let everything = names.iter().any(|n| n == ALL_KEYWORD);
            config
                .environments
                .iter()
                .filter(|env| everything || names.contains(&env.name))
                .cloned()
                .collect()
        }
    };

    Ok(ExecutionPlan {
        excluded_count: config.environments.len() - environments.len(),
        environments,
    })
}

//! # List Command Module / 列表命令模块
//!
//! Prints the environments of the matrix: the default run list, or every
//! declared environment with its description.
//!
//! 打印矩阵中的环境：默认运行列表，或所有已声明的环境及其描述。

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::core::config::MatrixConfig;
use crate::infra::t;

use super::{load_config, select_locale};

/// Executes the list command.
/// 执行列表命令。
pub fn execute(config_path: &Path, all: bool, lang: Option<String>) -> Result<()> {
    let config = load_config(config_path)?;
    let locale = select_locale(lang.as_deref(), &config);
    for line in render(&config, all, &locale) {
        println!("{line}");
    }
    Ok(())
}

/// The lines printed by `list`. Without `all`, just the names of the default
/// run list in declared order, one per line, so the output can be fed back
/// into `-e`.
pub fn render(config: &MatrixConfig, all: bool, locale: &str) -> Vec<String> {
    if !all {
        return config
            .environments
            .iter()
            .filter(|env| env.in_default_run)
            .map(|env| env.name.clone())
            .collect();
    }

    let width = config.names().map(str::len).max().unwrap_or(0);
    let mut lines = vec![t!("list_header", locale = locale).bold().to_string()];
    for env in &config.environments {
        let marker = if env.in_default_run { "*" } else { " " };
        let description = env
            .description
            .clone()
            .unwrap_or_else(|| format!("[{}]", env.interpreter));
        lines.push(format!("{marker} {:<width$}  {description}", env.name));
    }
    lines.push(t!("list_default_marker", locale = locale).dimmed().to_string());
    lines
}

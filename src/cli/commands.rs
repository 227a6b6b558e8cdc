//! # Commands Module / 命令模块
//!
//! The commands of the `env-matrix` binary, plus the configuration loading
//! they share.
//!
//! `env-matrix` 二进制文件的各个命令，以及它们共享的配置加载逻辑。

pub mod init;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::config::{MatrixConfig, parse_config};
use crate::infra::t;

/// Reads and parses the configuration file at `path`.
/// 读取并解析 `path` 处的配置文件。
pub fn load_config(path: &Path) -> Result<MatrixConfig> {
    let source = fs::read_to_string(path)
        .with_context(|| t!("config_read_failed", path = path.display()).to_string())?;
    let config = parse_config(&source)
        .with_context(|| t!("config_parse_failed", path = path.display()).to_string())?;
    tracing::debug!(
        path = %path.display(),
        environments = config.environments.len(),
        "loaded configuration"
    );
    Ok(config)
}

/// Picks the output language: `--lang`, then the configuration file, then
/// the system locale.
///
/// 选择输出语言：先 `--lang`，然后是配置文件，最后是系统语言。
pub fn select_locale(requested: Option<&str>, config: &MatrixConfig) -> String {
    match requested.or(config.settings.language.as_deref()) {
        Some(lang) => crate::resolve_locale(lang),
        None => crate::detect_locale(),
    }
}

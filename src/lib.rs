//! # env-matrix Library / env-matrix 库
//!
//! This library provides the core functionality for the env-matrix tool,
//! a configuration-driven runner that executes command suites across a
//! matrix of isolated interpreter environments.
//!
//! 此库为 env-matrix 工具提供核心功能，
//! 这是一个配置驱动的运行器，可在由隔离解释器环境组成的矩阵中执行命令集。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration model, planning and the execution engine
//! - `infra` - Subprocess capture, ephemeral contexts, environment snapshot, logging
//! - `reporting` - Console, HTML and JSON reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置模型、执行计划和执行引擎
//! - `infra` - 子进程捕获、临时上下文、环境变量快照、日志
//! - `reporting` - 控制台、HTML 和 JSON 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::execution;
pub use core::models;

/// Detects the locale to use when neither `--lang` nor the configuration
/// file picks one.
///
/// It attempts to match the full system locale (e.g., "zh-CN"), then just the
/// language code (e.g., "en"), and finally falls back to "en".
pub fn detect_locale() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    resolve_locale(&locale)
}

/// Maps a requested locale onto one that has translations.
/// 将请求的语言区域映射到有翻译的语言区域。
pub fn resolve_locale(requested: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    if available_locales.contains(&requested) {
        return requested.to_string();
    }
    requested
        .split(['-', '_'])
        .next()
        .and_then(|lang_code| {
            available_locales
                .iter()
                .find(|available| available.split('-').next() == Some(lang_code))
        })
        .map(|lang| lang.to_string())
        .unwrap_or_else(|| "en".to_string())
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

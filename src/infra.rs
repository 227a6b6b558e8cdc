//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for env-matrix,
//! including command execution, ephemeral contexts, the environment snapshot
//! and logging setup.
//!
//! 此模块为 env-matrix 提供基础设施服务，
//! 包括命令执行、临时上下文、环境变量快照和日志设置。

pub mod command;
pub mod env;
pub mod fs;
pub mod logging;

// Re-export i18n functions for easier access
pub use rust_i18n::t;

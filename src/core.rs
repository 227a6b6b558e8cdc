//! # Core Module / 核心模块
//!
//! This module contains the core functionality of env-matrix: the
//! configuration model, brace expansion, planning and the execution engine.
//!
//! 此模块包含 env-matrix 的核心功能：配置模型、花括号展开、执行计划和执行引擎。

pub mod config;
pub mod error;
pub mod execution;
pub mod expand;
pub mod interpreter;
pub mod models;
pub mod planner;
pub mod template;

// Re-exports
pub use config::{EnvironmentSpec, MatrixConfig, parse_config};
pub use execution::run_matrix;
pub use models::{MatrixResult, RunResult};

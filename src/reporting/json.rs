//! # JSON Reporting Module / JSON 报告模块
//!
//! Writes a machine-readable record of a matrix run for CI consumption.
//!
//! 写出矩阵运行的机器可读记录，供 CI 使用。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::models::{MatrixResult, MatrixStatus};

/// The document written by `write_json_report`.
/// `write_json_report` 写出的文档。
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub tool_version: &'static str,
    pub status: MatrixStatus,
    pub exit_code: i32,
    #[serde(flatten)]
    pub matrix: &'a MatrixResult,
}

impl<'a> JsonReport<'a> {
    pub fn new(matrix: &'a MatrixResult) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION"),
            status: matrix.status(),
            exit_code: matrix.exit_code(),
            matrix,
        }
    }
}

/// Serializes the matrix result as pretty-printed JSON to `output_path`.
///
/// 将矩阵结果以格式化 JSON 序列化到 `output_path`。
pub fn write_json_report(matrix: &MatrixResult, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(matrix))
        .context("Failed to serialize JSON report")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))
}

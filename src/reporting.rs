//! # Reporting Module / 报告模块
//!
//! This module handles the generation and display of matrix reports in
//! multiple formats: a colored console summary, an HTML page and a JSON
//! document for CI.
//!
//! 此模块处理多种格式的矩阵报告生成和显示：彩色控制台摘要、HTML 页面以及供 CI 使用的 JSON 文档。

pub mod console;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::generate_html_report;
pub use json::write_json_report;

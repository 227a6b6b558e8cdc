//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a self-contained HTML page with summary counts, a table of
//! environments and the captured output of every failing command.
//!
//! 渲染一个独立的 HTML 页面，包含汇总计数、环境表格以及每条失败命令的捕获输出。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::{MatrixResult, Outcome, RunResult};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; color: #24292e; }
.summary-container { display: flex; gap: 2em; margin-bottom: 1.5em; }
.summary-item { display: flex; flex-direction: column; align-items: center; }
.count { font-size: 2em; font-weight: bold; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #e1e4e8; padding: 0.5em; text-align: left; vertical-align: top; }
.status-passed { color: #22863a; }
.status-failed { color: #cb2431; }
.status-errored { color: #b31d28; font-weight: bold; }
.status-ignored { color: #b08800; }
.status-skipped { color: #6a737d; }
details pre { background: #f6f8fa; padding: 1em; overflow-x: auto; white-space: pre-wrap; }
"#;

/// Generates an HTML report from the results of a matrix run.
///
/// # Errors
/// Returns an error if the file cannot be written.
///
/// 根据矩阵运行结果生成 HTML 报告。无法写入文件时返回错误。
pub fn generate_html_report(matrix: &MatrixResult, output_path: &Path, locale: &str) -> Result<()> {
    let page = render(matrix, locale);
    fs::write(output_path, page.into_string())
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))
}

/// Renders the report page. Markup escaping is handled by `maud`.
pub fn render(matrix: &MatrixResult, locale: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale).to_string()) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.main_header", locale = locale).to_string()) }
                p class=(if matrix.passed() { "status-passed" } else { "status-failed" }) {
                    @if matrix.passed() {
                        (t!("html_report.overall_passed", locale = locale).to_string())
                    } @else {
                        (t!("html_report.overall_failed", locale = locale).to_string())
                    }
                }
                div class="summary-container" {
                    (summary_item(matrix.len(), &t!("html_report.summary.total", locale = locale), ""))
                    (summary_item(matrix.count(Outcome::Passed), &t!("html_report.summary.passed", locale = locale), "status-passed"))
                    (summary_item(matrix.count(Outcome::Failed), &t!("html_report.summary.failed", locale = locale), "status-failed"))
                    (summary_item(matrix.count(Outcome::Errored), &t!("html_report.summary.errored", locale = locale), "status-errored"))
                    (summary_item(matrix.count(Outcome::Skipped), &t!("html_report.summary.skipped", locale = locale), "status-skipped"))
                }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.header.name", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.status", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.duration", locale = locale).to_string()) }
                            th { (t!("html_report.table.header.details", locale = locale).to_string()) }
                        }
                    }
                    tbody {
                        @for result in matrix.iter() {
                            (result_row(result, locale))
                        }
                    }
                }
            }
        }
    }
}

fn summary_item(count: usize, label: &str, class: &str) -> Markup {
    html! {
        div class="summary-item" {
            span class={ "count " (class) } { (count) }
            span class="label" { (label) }
        }
    }
}

fn result_row(result: &RunResult, locale: &str) -> Markup {
    html! {
        tr {
            td { (result.env) }
            td class=(result.status_class()) { (result.status_str(locale)) }
            td { (format!("{:.2}s", result.duration.as_secs_f64())) }
            td {
                @if let Some(error) = &result.error {
                    div { (error.to_string()) }
                }
                @for record in result.failing_commands() {
                    details {
                        summary { code { (record.command) } }
                        pre { (record.combined_output()) }
                    }
                }
            }
        }
    }
}

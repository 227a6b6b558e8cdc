//! # Console Reporting Module / 控制台报告模块
//!
//! Prints the end-of-run summary and the full captured output of every
//! environment that did not pass.
//!
//! 打印运行结束时的摘要，以及每个未通过环境的完整捕获输出。

use colored::*;

use crate::core::models::{MatrixResult, Outcome, RunResult};
use crate::infra::t;

/// Prints a formatted summary of a matrix run to the console.
/// Every environment is listed with its terminal state, duration and the
/// exit code of its last failing command.
///
/// 在控制台打印矩阵运行的格式化摘要。列出每个环境的终止状态、
/// 持续时间以及最后一条失败命令的退出码。
///
/// # Output Format / 输出格式
/// ```text
/// --- Matrix Summary ---
///   - Passed            | py36                           |      4.21s
///   - Failed            | py37                           |      3.90s  (exit code 1)
///   - Failed (ignored)  | quality                        |      1.02s  (exit code 1)
///   - Skipped           | py38                           |      0.00s
/// ```
pub fn print_summary(matrix: &MatrixResult, locale: &str) {
    println!("\n{}", t!("summary_banner", locale = locale).bold());

    for result in matrix.iter() {
        let status_str = result.status_str(locale);
        let status_colored = match result.outcome {
            Outcome::Passed => status_str.green(),
            Outcome::Skipped => status_str.dimmed(),
            _ if result.ignore_errors => status_str.yellow(),
            _ => status_str.red(),
        };
        let exit_str = result
            .exit_code
            .map(|code| format!(" (exit code {code})"))
            .unwrap_or_default();

        println!(
            "  - {:<18} | {:<30} | {:>9.2}s {}",
            status_colored,
            result.env,
            result.duration.as_secs_f64(),
            exit_str
        );
    }

    println!(
        "{}",
        t!(
            "summary_counts",
            locale = locale,
            passed = matrix.count(Outcome::Passed),
            failed = matrix.count(Outcome::Failed),
            errored = matrix.count(Outcome::Errored),
            skipped = matrix.count(Outcome::Skipped)
        )
        .dimmed()
    );
}

/// Prints detailed information about every environment that failed or
/// errored, including ignored failures: the cause and the full output of
/// each failing command.
///
/// 打印每个失败或出错环境的详细信息（包括被忽略的失败）：原因以及每条失败命令的完整输出。
pub fn print_failure_details(matrix: &MatrixResult, locale: &str) {
    let failures: Vec<&RunResult> = matrix.iter().filter(|r| r.is_failure()).collect();
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("report_header_failure", locale = locale).red(),
            result.env.cyan(),
            result.status_str(locale)
        );
        if let Some(error) = &result.error {
            println!("  {}", error.to_string().yellow());
        }

        for record in result.failing_commands() {
            println!("\n--- {} ---", record.command.yellow());
            let output = record.combined_output();
            if output.is_empty() {
                println!("{}", t!("no_output", locale = locale).dimmed());
            } else {
                println!("{output}");
            }
        }
        println!("\n{}", "-".repeat(80));
    }
}

//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command of the env-matrix CLI,
//! which executes the selected environments of the matrix and reports the
//! aggregated result.
//!
//! 此模块实现了 env-matrix CLI 的 `run` 命令，
//! 执行矩阵中选定的环境并报告汇总结果。

use anyhow::{Context, Result};
use colored::*;
use std::{path::PathBuf, sync::Arc};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        execution::{RunContext, run_matrix},
        planner::Selection,
    },
    infra::{env::EnvSnapshot, fs as infra_fs, t},
    reporting::{generate_html_report, print_failure_details, print_summary, write_json_report},
};

use super::{load_config, select_locale};

/// Options of the `run` command.
/// `run` 命令的选项。
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: PathBuf,
    /// Project root; defaults to the directory holding the config file.
    pub root: Option<PathBuf>,
    /// Raw `-e` values / 原始 `-e` 参数值
    pub envs: Vec<String>,
    pub jobs: Option<usize>,
    pub skip_missing_interpreters: bool,
    pub verbose: u8,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    /// Everything after `--` / `--` 之后的所有内容
    pub posargs: Vec<String>,
    /// Language requested on the command line / 命令行请求的语言
    pub lang: Option<String>,
}

/// Executes the run command.
///
/// # Returns
/// `Ok(())` if the matrix passed; an error naming the failure otherwise.
///
/// 执行运行命令。矩阵通过时返回 `Ok(())`，否则返回说明失败的错误。
pub async fn execute(opts: RunOptions) -> Result<()> {
    let config_path = infra_fs::absolute_path(&opts.config)
        .with_context(|| t!("config_read_failed", path = opts.config.display()).to_string())?;
    let config = load_config(&config_path)?;

    let locale = select_locale(opts.lang.as_deref(), &config);
    rust_i18n::set_locale(&locale);

    let root_dir = match &opts.root {
        Some(root) => infra_fs::absolute_path(root)?,
        None => config_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    println!(
        "{}",
        t!("loading_config", locale = &locale, path = config_path.display())
    );
    println!(
        "{}",
        t!("project_root_detected", locale = &locale, path = root_dir.display())
    );

    let selection = Selection::from_args(&opts.envs)?;
    let jobs = opts
        .jobs
        .or(config.settings.jobs)
        .unwrap_or(num_cpus::get() / 2 + 1);

    let mut ctx = RunContext::new(root_dir, EnvSnapshot::capture());
    ctx.posargs = opts.posargs.clone();
    ctx.skip_missing_interpreters =
        opts.skip_missing_interpreters || config.settings.skip_missing_interpreters;
    ctx.show_output = opts.verbose > 0;
    ctx.locale = locale.clone();

    tracing::debug!(?selection, jobs, "starting matrix run");
    println!("{}", t!("running_jobs", locale = &locale, jobs = jobs).bold());

    let stop_token = setup_signal_handler(&locale);
    let matrix = run_matrix(Arc::new(config), &selection, ctx, jobs, stop_token).await?;

    if matrix.is_empty() {
        println!("{}", t!("no_envs_selected", locale = &locale).yellow());
        return Ok(());
    }

    print_summary(&matrix, &locale);

    if let Some(report_path) = &opts.html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(&matrix, report_path, &locale) {
            eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e);
        }
    }
    if let Some(report_path) = &opts.json {
        println!(
            "\n{}",
            t!("generating_json_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = write_json_report(&matrix, report_path) {
            eprintln!("{} {:#}", t!("report_failed", locale = &locale).red(), e);
        }
    }

    print_failure_details(&matrix, &locale);

    if matrix.interrupted {
        println!("{}", t!("run_interrupted", locale = &locale).yellow());
    }

    if matrix.passed() {
        println!("\n{}", t!("all_passed", locale = &locale).green().bold());
        Ok(())
    } else {
        anyhow::bail!(t!("matrix_failed", locale = &locale).to_string())
    }
}

/// Sets up a signal handler for graceful shutdown.
/// The returned token is cancelled on the first Ctrl-C.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    token
}

//! # Data Models Module / 数据模型模块
//!
//! Results produced by a matrix run: one `RunResult` per environment, each
//! holding the records of the commands it executed, and the aggregated
//! `MatrixResult`.
//!
//! 矩阵运行产生的结果：每个环境一个 `RunResult`，其中包含所执行命令的记录，
//! 以及汇总后的 `MatrixResult`。

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::EnvError;
use crate::infra::command::CapturedOutput;
use crate::infra::t;

/// The terminal state of one environment.
/// 单个环境的终止状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every command exited with status zero.
    /// 所有命令都以状态 0 退出。
    Passed,
    /// At least one command failed or timed out.
    /// 至少一条命令失败或超时。
    Failed,
    /// The environment could not be set up (interpreter, context, dependencies)
    /// or was interrupted.
    /// 环境无法建立（解释器、上下文、依赖），或被中断。
    Errored,
    /// The environment never ran.
    /// 环境从未运行。
    Skipped,
}

impl Outcome {
    pub fn label(&self, locale: &str) -> String {
        match self {
            Outcome::Passed => t!("report.status_passed", locale = locale).to_string(),
            Outcome::Failed => t!("report.status_failed", locale = locale).to_string(),
            Outcome::Errored => t!("report.status_errored", locale = locale).to_string(),
            Outcome::Skipped => t!("report.status_skipped", locale = locale).to_string(),
        }
    }
}

/// The record of one executed command.
/// 单条已执行命令的记录。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    /// The command line as rendered / 渲染后的命令行
    pub command: String,
    /// `None` if the process could not be spawned, was killed or timed out.
    /// 如果进程无法派生、被终止或超时，则为 `None`。
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
    pub success: bool,
}

impl CommandRecord {
    /// Builds a record from captured subprocess output. Spawn errors are
    /// appended to stderr so they surface in reports.
    pub fn from_output(command: String, output: CapturedOutput) -> Self {
        let success = output.success();
        let exit_code = output.exit_code();
        let mut stderr = output.stderr;
        if let Err(e) = &output.status {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&e.to_string());
        }
        Self {
            command,
            exit_code,
            stdout: output.stdout,
            stderr,
            duration: output.duration,
            timed_out: output.timed_out,
            success,
        }
    }

    /// A record for a command that never reached the process stage, e.g.
    /// because its template could not be rendered.
    pub fn not_started(command: String, reason: String) -> Self {
        Self {
            command,
            exit_code: None,
            stdout: String::new(),
            stderr: reason,
            duration: Duration::ZERO,
            timed_out: false,
            success: false,
        }
    }

    /// stdout and stderr, joined for display.
    /// 用于显示的 stdout 与 stderr 合并内容。
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", "") => String::new(),
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// The outcome of one environment.
/// 单个环境的结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub env: String,
    pub outcome: Outcome,
    /// Whether the environment ran in ignore-errors mode.
    /// 环境是否以忽略错误模式运行。
    pub ignore_errors: bool,
    pub interpreter: Option<PathBuf>,
    /// Context creation and dependency installation steps that ran.
    /// 已执行的上下文创建和依赖安装步骤。
    pub setup: Vec<CommandRecord>,
    pub commands: Vec<CommandRecord>,
    /// Exit code of the last failing command / 最后一条失败命令的退出码
    pub exit_code: Option<i32>,
    /// Why the environment did not pass, if it did not.
    /// 环境未通过的原因（如有）。
    pub error: Option<EnvError>,
    pub duration: Duration,
}

impl RunResult {
    pub fn new(env: impl Into<String>, ignore_errors: bool) -> Self {
        Self {
            env: env.into(),
            outcome: Outcome::Skipped,
            ignore_errors,
            interpreter: None,
            setup: Vec::new(),
            commands: Vec::new(),
            exit_code: None,
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// A result for an environment that stopped with `error` before or while
    /// running its commands.
    pub fn errored(env: impl Into<String>, ignore_errors: bool, error: EnvError) -> Self {
        Self {
            outcome: Outcome::Errored,
            error: Some(error),
            ..Self::new(env, ignore_errors)
        }
    }

    pub fn skipped(env: impl Into<String>, ignore_errors: bool, error: Option<EnvError>) -> Self {
        Self {
            outcome: Outcome::Skipped,
            error,
            ..Self::new(env, ignore_errors)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed | Outcome::Errored)
    }

    /// A failure that makes the matrix fail: Failed or Errored in an
    /// environment that does not ignore errors.
    ///
    /// 会导致矩阵失败的失败：不忽略错误的环境中的 Failed 或 Errored。
    pub fn is_blocking_failure(&self) -> bool {
        self.is_failure() && !self.ignore_errors
    }

    /// A failure recorded in ignore-errors mode.
    pub fn is_ignored_failure(&self) -> bool {
        self.is_failure() && self.ignore_errors
    }

    /// The commands that did not succeed, including failed setup steps.
    /// 未成功的命令，包括失败的准备步骤。
    pub fn failing_commands(&self) -> impl Iterator<Item = &CommandRecord> {
        self.setup
            .iter()
            .chain(self.commands.iter())
            .filter(|record| !record.success)
    }

    /// Status label for display; ignored failures are marked as such.
    /// 用于显示的状态标签；被忽略的失败会被特别标注。
    pub fn status_str(&self, locale: &str) -> String {
        if self.is_ignored_failure() {
            t!(
                "report.status_ignored",
                locale = locale,
                status = self.outcome.label(locale)
            )
            .to_string()
        } else {
            self.outcome.label(locale)
        }
    }

    /// CSS class used by the HTML report.
    pub fn status_class(&self) -> &'static str {
        match self.outcome {
            _ if self.is_ignored_failure() => "status-ignored",
            Outcome::Passed => "status-passed",
            Outcome::Failed => "status-failed",
            Outcome::Errored => "status-errored",
            Outcome::Skipped => "status-skipped",
        }
    }
}

/// Overall status of a matrix run.
/// 矩阵运行的总体状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixStatus {
    Passed,
    Failed,
}

/// The aggregated results of one invocation, in declared environment order.
/// 单次调用的汇总结果，按环境声明顺序排列。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatrixResult {
    pub results: Vec<RunResult>,
    /// Set when the run was cancelled by an interrupt.
    /// 当运行被中断信号取消时设置。
    pub interrupted: bool,
}

impl MatrixResult {
    pub fn new(results: Vec<RunResult>, interrupted: bool) -> Self {
        Self {
            results,
            interrupted,
        }
    }

    pub fn get(&self, env: &str) -> Option<&RunResult> {
        self.results.iter().find(|r| r.env == env)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter()
    }

    /// Failed if any non-ignoring environment failed or errored, or if the
    /// run was interrupted; Passed otherwise.
    ///
    /// 如果任何不忽略错误的环境失败或出错，或运行被中断，则为 Failed；否则为 Passed。
    pub fn status(&self) -> MatrixStatus {
        if self.interrupted || self.results.iter().any(RunResult::is_blocking_failure) {
            MatrixStatus::Failed
        } else {
            MatrixStatus::Passed
        }
    }

    pub fn passed(&self) -> bool {
        self.status() == MatrixStatus::Passed
    }

    /// Process exit code: 0 iff the matrix passed.
    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }

    /// Number of environments in the given terminal state.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }
}

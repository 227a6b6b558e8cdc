//! # Matrix Execution Engine Module / 矩阵执行引擎模块
//!
//! Runs the environments of an execution plan. Each environment goes through
//! a linear sequence: resolve the interpreter, create an isolated context,
//! install dependencies, execute commands. Environments run concurrently up to
//! a job limit and are joined before the `MatrixResult` is built.
//!
//! 运行执行计划中的环境。每个环境都经历一个线性序列：解析解释器、
//! 创建隔离上下文、安装依赖、执行命令。环境在任务数上限内并发运行，
//! 并在构建 `MatrixResult` 之前全部汇合。

use colored::*;
use futures::{StreamExt, stream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{EnvironmentSpec, MatrixConfig, MatrixSettings},
        error::{EnvError, MatrixError},
        models::{CommandRecord, MatrixResult, Outcome, RunResult},
        planner::{self, ExecutionPlan, Selection},
        template::{self, Placeholders},
    },
    infra::{
        command::Invocation,
        env::{self, EnvSnapshot},
        fs::{self as infra_fs, EnvContext},
        t,
    },
};

/// Invocation-wide inputs shared read-only by every environment.
/// 所有环境只读共享的调用级输入。
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Root of the project under test; `{rootdir}` / 被测项目的根目录
    pub root_dir: PathBuf,
    /// Positional arguments substituted for `{posargs}` / 替换 `{posargs}` 的位置参数
    pub posargs: Vec<String>,
    /// Snapshot of the invoker's variables / 调用者变量的快照
    pub snapshot: Arc<EnvSnapshot>,
    pub skip_missing_interpreters: bool,
    /// Print the output of every command as it completes / 每条命令完成时打印其输出
    pub show_output: bool,
    pub locale: String,
}

impl RunContext {
    pub fn new(root_dir: PathBuf, snapshot: EnvSnapshot) -> Self {
        Self {
            root_dir,
            posargs: Vec::new(),
            snapshot: Arc::new(snapshot),
            skip_missing_interpreters: false,
            show_output: false,
            locale: "en".to_string(),
        }
    }
}

/// Plans and runs a matrix.
///
/// # Errors
/// `MatrixError::UnknownEnvironment` if `selection` names undeclared
/// environments. Per-environment failures never produce an `Err`; they are
/// recorded in the returned `MatrixResult`.
///
/// 规划并运行矩阵。如果 `selection` 包含未声明的环境，返回
/// `MatrixError::UnknownEnvironment`。单个环境的失败不会产生 `Err`，
/// 而是记录在返回的 `MatrixResult` 中。
pub async fn run_matrix(
    config: Arc<MatrixConfig>,
    selection: &Selection,
    ctx: RunContext,
    jobs: usize,
    cancel: CancellationToken,
) -> Result<MatrixResult, MatrixError> {
    let plan = planner::plan_execution(&config, selection)?;
    Ok(run_plan(config, plan, ctx, jobs, cancel).await)
}

/// Runs every environment of `plan` with at most `jobs` in flight and joins
/// them. Results come back in declared order.
///
/// If `cancel` fires, in-flight environments are aborted (their processes are
/// killed) and recorded as Errored; environments that had not started yet are
/// recorded as Skipped.
///
/// 以最多 `jobs` 个并发运行 `plan` 中的每个环境并等待全部完成。结果按声明顺序返回。
/// 如果 `cancel` 被触发，正在运行的环境会被中止（其进程被终止）并记录为 Errored；
/// 尚未开始的环境记录为 Skipped。
pub async fn run_plan(
    config: Arc<MatrixConfig>,
    plan: ExecutionPlan,
    ctx: RunContext,
    jobs: usize,
    cancel: CancellationToken,
) -> MatrixResult {
    let ctx = Arc::new(ctx);

    let workers = stream::iter(plan.environments.into_iter().enumerate().map(|(index, spec)| {
        let config = Arc::clone(&config);
        let ctx = Arc::clone(&ctx);
        let cancel = cancel.clone();

        async move {
            let name = spec.name.clone();
            let ignore_errors = spec.ignore_errors;

            if cancel.is_cancelled() {
                return (index, RunResult::skipped(name, ignore_errors, None));
            }

            let mut handle = tokio::spawn(async move {
                run_environment(&spec, &config.settings, &ctx).await
            });

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    handle.abort();
                    RunResult::errored(name, ignore_errors, EnvError::Cancelled)
                }
                joined = &mut handle => match joined {
                    Ok(result) => result,
                    Err(e) => RunResult::errored(
                        name,
                        ignore_errors,
                        EnvError::Internal { reason: e.to_string() },
                    ),
                },
            };
            (index, result)
        }
    }));

    let mut results: Vec<(usize, RunResult)> =
        workers.buffer_unordered(jobs.max(1)).collect().await;
    results.sort_by_key(|(index, _)| *index);

    MatrixResult::new(
        results.into_iter().map(|(_, result)| result).collect(),
        cancel.is_cancelled(),
    )
}

/// Runs a single environment from interpreter resolution to its last
/// command and returns its result. Never fails: every problem is recorded.
///
/// 运行单个环境（从解析解释器到最后一条命令）并返回结果。
/// 不会失败：所有问题都会被记录下来。
pub async fn run_environment(
    spec: &EnvironmentSpec,
    settings: &MatrixSettings,
    ctx: &RunContext,
) -> RunResult {
    let locale = ctx.locale.as_str();
    println!(
        "{}",
        t!("run.env_starting", locale = locale, name = &spec.name).blue()
    );

    let start = Instant::now();
    let mut result = RunResult::new(&spec.name, spec.ignore_errors);
    if let Err(error) = execute_steps(spec, settings, ctx, &mut result).await {
        let skip = ctx.skip_missing_interpreters
            && matches!(error, EnvError::InterpreterNotFound { .. });
        result.outcome = if skip { Outcome::Skipped } else { Outcome::Errored };
        result.error = Some(error);
    }
    result.duration = start.elapsed();

    report_finished(&result, locale);
    result
}

/// Executes the setup steps and the commands. Setup problems are returned
/// as `Err`; command failures are written into `result`.
async fn execute_steps(
    spec: &EnvironmentSpec,
    settings: &MatrixSettings,
    ctx: &RunContext,
    result: &mut RunResult,
) -> Result<(), EnvError> {
    let interpreter = spec.interpreter.resolve()?;
    result.interpreter = Some(interpreter.clone());

    let context = EnvContext::create(&spec.name).map_err(|e| EnvError::ContextCreation {
        reason: format!("{e:#}"),
    })?;
    tracing::debug!(env = %spec.name, dir = %context.root().display(), "created context");

    let vars = env::context_environment(
        &ctx.snapshot,
        &spec.passenv,
        &spec.setenv,
        &spec.name,
        &context.envdir,
        &context.bindir,
    );
    let timeout = spec.timeout_secs.map(Duration::from_secs);
    let packages = install_packages(spec, ctx);
    let placeholders = Placeholders {
        envname: &spec.name,
        envdir: &context.envdir,
        envbindir: &context.bindir,
        envtmpdir: &context.tmpdir,
        rootdir: &ctx.root_dir,
        interpreter: Some(&interpreter),
        posargs: &ctx.posargs,
        packages: &packages,
    };

    // 1. Materialise the context.
    if !template::is_blank(&settings.create_command) {
        let record = run_step(&settings.create_command, &placeholders, &vars, &ctx.root_dir, timeout).await;
        if !record.success {
            let reason = describe_failure(&record);
            result.exit_code = record.exit_code;
            result.setup.push(record);
            return Err(EnvError::ContextCreation { reason });
        }
        result.setup.push(record);
    }
    context
        .ensure_layout()
        .map_err(|e| EnvError::ContextCreation { reason: format!("{e:#}") })?;

    // 2. Install dependencies.
    if !packages.is_empty() && !template::is_blank(&spec.install_command) {
        println!(
            "{}",
            t!("run.installing", locale = &ctx.locale, name = &spec.name, count = packages.len()).cyan()
        );
        let record = run_step(&spec.install_command, &placeholders, &vars, &ctx.root_dir, timeout).await;
        if !record.success {
            let reason = describe_failure(&record);
            result.exit_code = record.exit_code;
            result.setup.push(record);
            return Err(EnvError::DependencyInstall { reason });
        }
        result.setup.push(record);
    }

    // 3. Commands, strictly in declared order.
    let cwd = infra_fs::working_dir(&ctx.root_dir, spec.changedir.as_deref());
    let mut first_failure: Option<EnvError> = None;

    for command in &spec.commands {
        let record = run_step(command, &placeholders, &vars, &cwd, timeout).await;
        if ctx.show_output {
            print_command_output(&spec.name, &record);
        }

        if !record.success {
            let failure = if record.timed_out {
                EnvError::Timeout {
                    command: record.command.clone(),
                    secs: spec.timeout_secs.unwrap_or_default(),
                }
            } else {
                EnvError::CommandFailure {
                    command: record.command.clone(),
                    code: record.exit_code,
                }
            };
            println!(
                "{}",
                t!("run.command_failed", locale = &ctx.locale, name = &spec.name, error = &failure).red()
            );
            result.exit_code = record.exit_code;
            first_failure.get_or_insert(failure);
            result.commands.push(record);
            if !spec.ignore_errors {
                break;
            }
        } else {
            result.commands.push(record);
        }
    }

    result.outcome = if first_failure.is_some() {
        Outcome::Failed
    } else {
        Outcome::Passed
    };
    result.error = first_failure;
    Ok(())
}

/// The dependency specifiers to install: `deps`, then the project under test
/// (with its extras) unless `skip_install` is set.
///
/// 要安装的依赖说明符：先是 `deps`，然后是被测项目（带其 extras），除非设置了 `skip_install`。
pub fn install_packages(spec: &EnvironmentSpec, ctx: &RunContext) -> Vec<String> {
    let mut packages = spec.deps.clone();
    if !spec.skip_install {
        let root = ctx.root_dir.to_string_lossy();
        if spec.extras.is_empty() {
            packages.push(root.into_owned());
        } else {
            packages.push(format!("{root}[{}]", spec.extras.join(",")));
        }
    }
    packages
}

/// Renders and runs one template, turning every outcome into a record.
async fn run_step(
    template_str: &str,
    placeholders: &Placeholders<'_>,
    vars: &std::collections::BTreeMap<String, String>,
    cwd: &std::path::Path,
    timeout: Option<Duration>,
) -> CommandRecord {
    let argv = match template::render_argv(template_str, placeholders, vars) {
        Ok(argv) => argv,
        Err(e) => return CommandRecord::not_started(template_str.to_string(), e.to_string()),
    };
    let display = shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "));

    let output = Invocation {
        argv: &argv,
        cwd,
        env: vars,
        timeout,
    }
    .run()
    .await;
    CommandRecord::from_output(display, output)
}

fn describe_failure(record: &CommandRecord) -> String {
    let status = match (record.timed_out, record.exit_code) {
        (true, _) => "timed out".to_string(),
        (false, Some(code)) => format!("exit code {code}"),
        (false, None) => "did not run".to_string(),
    };
    format!("`{}` {}", record.command, status)
}

fn print_command_output(env_name: &str, record: &CommandRecord) {
    let output = record.combined_output();
    let header = format!("[{env_name}] $ {}", record.command).dimmed();
    if output.is_empty() {
        println!("{header}");
    } else {
        println!("{header}\n{output}");
    }
}

fn report_finished(result: &RunResult, locale: &str) {
    let duration = format!("{:.2}", result.duration.as_secs_f64());
    let line = t!(
        "run.env_finished",
        locale = locale,
        name = &result.env,
        status = result.status_str(locale),
        duration = duration
    );
    let line = match result.outcome {
        Outcome::Passed => line.green(),
        Outcome::Skipped => line.dimmed(),
        _ if result.ignore_errors => line.yellow(),
        _ => line.red(),
    };
    println!("{line}");
}

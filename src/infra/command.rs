//! # Command Execution Module / 命令执行模块
//!
//! Spawns subprocesses and captures their output. stdout and stderr are read
//! concurrently into owned buffers, so nothing is shared between commands or
//! environments while they run.
//!
//! 派生子进程并捕获其输出。stdout 和 stderr 被并发读取到各自独立的缓冲区，
//! 因此命令或环境之间在运行时没有任何共享。

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

/// The structured result of running one subprocess.
/// 运行单个子进程的结构化结果。
#[derive(Debug)]
pub struct CapturedOutput {
    /// The exit status, or the error that prevented spawning or waiting.
    /// 退出状态，或导致无法派生或等待的错误。
    pub status: std::io::Result<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    /// `true` if the process was killed because it exceeded its timeout.
    /// 如果进程因超时而被终止，则为 `true`。
    pub timed_out: bool,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        matches!(&self.status, Ok(status) if status.success())
    }

    /// The exit code, if the process exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        self.status.as_ref().ok().and_then(ExitStatus::code)
    }
}

/// Describes a process to launch: argv, working directory and the complete
/// environment it sees. Nothing is inherited from the invoking process.
///
/// 描述要启动的进程：argv、工作目录以及它所见的完整环境。
/// 不会从调用进程继承任何内容。
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub argv: &'a [String],
    pub cwd: &'a Path,
    pub env: &'a BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl Invocation<'_> {
    fn command(&self) -> Option<Command> {
        let (program, args) = self.argv.split_first()?;
        // Resolve the program against the context's own PATH.
        let program = match self.env.get("PATH") {
            Some(path) => which::which_in(program, Some(path), self.cwd)
                .map(|p| p.into_os_string())
                .unwrap_or_else(|_| program.into()),
            None => program.into(),
        };
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(self.cwd)
            .env_clear()
            .envs(self.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        Some(cmd)
    }

    /// Runs the invocation to completion or until its timeout elapses.
    /// On timeout the child is killed and `timed_out` is set.
    ///
    /// 运行该调用直至完成或超时。超时时子进程会被终止，并设置 `timed_out`。
    pub async fn run(&self) -> CapturedOutput {
        let start = Instant::now();
        let Some(cmd) = self.command() else {
            return CapturedOutput {
                status: Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "empty command line",
                )),
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
                timed_out: false,
            };
        };

        tracing::debug!(argv = ?self.argv, cwd = %self.cwd.display(), "spawning");

        let mut output = spawn_and_capture(cmd, self.timeout).await;
        output.duration = start.elapsed();
        if output.timed_out {
            tracing::debug!(argv = ?self.argv, "command timed out");
        }
        output
    }
}

/// How long output is still collected after a timed-out child was killed.
/// Grandchildren that inherited the pipes may keep them open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Spawns a command and captures its stdout and stderr separately.
/// Both streams are drained while waiting on the child, so a chatty process
/// cannot block on a full pipe. When `timeout` elapses the child is killed
/// and whatever it printed so far is kept.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
/// * `timeout` - Optional limit on the child's running time.
///
/// 派生一个命令，分别捕获其 stdout 和 stderr。
/// 在等待子进程时会同时读取两个流，因此输出较多的进程不会因管道写满而阻塞。
/// 超时后子进程会被终止，已输出的内容会被保留。
pub async fn spawn_and_capture(mut cmd: Command, timeout: Option<Duration>) -> CapturedOutput {
    let mut child = match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn() {
        Ok(child) => child,
        Err(e) => {
            return CapturedOutput {
                status: Err(e),
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
                timed_out: false,
            };
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();

    let drained = async {
        tokio::join!(drain(stdout, &mut out_buf), drain(stderr, &mut err_buf));
    };
    let bounded = async {
        match timeout {
            Some(limit) => {
                if tokio::time::timeout(limit + DRAIN_GRACE, drained).await.is_err() {
                    tracing::debug!("stopped reading output of a timed-out command");
                }
            }
            None => drained.await,
        }
    };
    let ((status, timed_out), ()) = tokio::join!(wait_for(&mut child, timeout), bounded);

    CapturedOutput {
        status,
        stdout: String::from_utf8_lossy(&out_buf).into_owned(),
        stderr: String::from_utf8_lossy(&err_buf).into_owned(),
        duration: Duration::ZERO,
        timed_out,
    }
}

async fn wait_for(child: &mut Child, timeout: Option<Duration>) -> (std::io::Result<ExitStatus>, bool) {
    let Some(limit) = timeout else {
        return (child.wait().await, false);
    };
    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => (status, false),
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill timed-out child");
            }
            let error = std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("timed out after {}s", limit.as_secs()),
            );
            (Err(error), true)
        }
    }
}

/// Appends everything read from `stream` to `buf`. Each chunk lands in `buf`
/// as soon as it is read, so a cancelled drain keeps what it already saw.
async fn drain<R: AsyncRead + Unpin>(stream: Option<R>, buf: &mut Vec<u8>) {
    let Some(mut stream) = stream else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read child output");
                break;
            }
        }
    }
}

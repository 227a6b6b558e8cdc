//! # Command Execution Unit Tests / 命令执行单元测试
//!
//! Tests subprocess capture: separate stdout/stderr buffers, a cleared
//! environment, working directories and timeouts.
//!
//! 测试子进程捕获：独立的 stdout/stderr 缓冲区、清空的环境、工作目录以及超时。

#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

use env_matrix::infra::command::Invocation;

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn base_env() -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()),
    );
    env
}

#[cfg(test)]
mod invocation_tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_stderr_separately() {
        let args = argv(&["sh", "-c", "echo out; echo err >&2; exit 3"]);
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: None,
        }
        .run()
        .await;

        assert!(!output.success());
        assert_eq!(output.exit_code(), Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.timed_out);
    }

    #[tokio::test]
    async fn test_environment_is_exactly_the_given_map() {
        let args = argv(&["env"]);
        let mut env = base_env();
        env.insert("ONLY_THIS".to_string(), "1".to_string());
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: None,
        }
        .run()
        .await;

        assert!(output.success());
        let names: Vec<&str> = output
            .stdout
            .lines()
            .filter_map(|line| line.split('=').next())
            .filter(|name| !name.is_empty())
            .collect();
        assert!(names.contains(&"ONLY_THIS"));
        assert!(names.contains(&"PATH"));
        assert!(!names.contains(&"HOME"));
        assert!(!names.contains(&"CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn test_runs_in_the_given_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let args = argv(&["ls"]);
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: dir.path(),
            env: &env,
            timeout: None,
        }
        .run()
        .await;

        assert!(output.success());
        assert!(output.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_process() {
        let args = argv(&["sleep", "5"]);
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: Some(Duration::from_millis(200)),
        }
        .run()
        .await;

        assert!(output.timed_out);
        assert!(!output.success());
        assert_eq!(output.exit_code(), None);
        assert!(output.duration < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_timeout_keeps_output_printed_before_the_kill() {
        let args = argv(&["sh", "-c", "echo before-hang; echo warn >&2; sleep 10"]);
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: Some(Duration::from_millis(500)),
        }
        .run()
        .await;

        assert!(output.timed_out);
        assert_eq!(output.stdout, "before-hang\n");
        assert_eq!(output.stderr, "warn\n");
        assert!(output.duration < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_program_is_a_spawn_error() {
        let args = argv(&["this_command_definitely_does_not_exist_12345"]);
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: None,
        }
        .run()
        .await;

        assert!(output.status.is_err());
        assert!(!output.success());
        assert_eq!(output.exit_code(), None);
    }

    #[tokio::test]
    async fn test_empty_argv() {
        let args: Vec<String> = Vec::new();
        let env = base_env();
        let output = Invocation {
            argv: &args,
            cwd: Path::new("/"),
            env: &env,
            timeout: None,
        }
        .run()
        .await;
        assert!(output.status.is_err());
    }
}

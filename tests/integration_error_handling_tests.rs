//! # Error Handling Integration Tests / 错误处理集成测试
//!
//! This module contains integration tests for error handling scenarios:
//! unreadable or malformed configuration files and command lines that cannot
//! be rendered or spawned.
//!
//! 此模块包含错误处理场景的集成测试：无法读取或格式错误的配置文件，
//! 以及无法渲染或无法派生的命令行。

#![cfg(unix)]

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::{TempDir, tempdir};

use common::{fixture, run_fixture, write_config};
use env_matrix::core::error::EnvError;
use env_matrix::core::models::Outcome;
use env_matrix::core::planner::Selection;

/// Helper function to create an invalid TOML configuration
/// 创建无效TOML配置的辅助函数
fn create_invalid_toml(temp_dir: &TempDir) -> std::path::PathBuf {
    let matrix_path = temp_dir.path().join("invalid.toml");
    let content = r#"
[matrix
envs = ["py38"]
"#;
    fs::write(&matrix_path, content).unwrap();
    matrix_path
}

/// Helper function to create a configuration whose default run list names an
/// undeclared environment
/// 创建默认运行列表引用未声明环境的配置的辅助函数
fn create_inconsistent_config(temp_dir: &TempDir) -> std::path::PathBuf {
    let matrix_path = temp_dir.path().join("inconsistent.toml");
    let content = r#"
[matrix]
envs = ["py38"]
envlist = ["py38", "py39"]
"#;
    fs::write(&matrix_path, content).unwrap();
    matrix_path
}

#[test]
fn test_invalid_toml_handling() {
    let temp_dir = tempdir().unwrap();
    let matrix_path = create_invalid_toml(&temp_dir);

    let mut cmd = Command::cargo_bin("env-matrix").unwrap();
    cmd.args(["run", "--lang", "en", "--config"]).arg(&matrix_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_inconsistent_config_handling() {
    let temp_dir = tempdir().unwrap();
    let matrix_path = create_inconsistent_config(&temp_dir);

    let mut cmd = Command::cargo_bin("env-matrix").unwrap();
    cmd.args(["run", "--lang", "en", "--config"]).arg(&matrix_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("undefined environment 'py39'"));
}

#[test]
fn test_nonexistent_config_file() {
    let temp_dir = tempdir().unwrap();

    let mut cmd = Command::cargo_bin("env-matrix").unwrap();
    cmd.args(["run", "--lang", "en", "--config"])
        .arg(temp_dir.path().join("nonexistent.toml"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read configuration file"));
}

#[test]
fn test_invalid_brace_selection() {
    let temp_dir = tempdir().unwrap();
    let config = write_config(&temp_dir, &fixture(r#"["a"]"#, ""));

    let mut cmd = Command::cargo_bin("env-matrix").unwrap();
    cmd.args(["run", "--lang", "en", "-e", "py{38", "-c"]).arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern 'py{38'"));
}

#[tokio::test]
async fn test_nonexistent_command_is_a_failure() {
    let source = fixture(
        r#"["unit"]"#,
        r#"
[env.unit]
commands = ["this_command_definitely_does_not_exist_12345"]
"#,
    );
    let matrix = run_fixture(&source, Selection::All).await;
    let unit = matrix.get("unit").unwrap();

    assert_eq!(unit.outcome, Outcome::Failed);
    assert!(matches!(&unit.error, Some(EnvError::CommandFailure { code: None, .. })));
    assert!(!unit.commands[0].stderr.is_empty());
}

#[tokio::test]
async fn test_unbalanced_quotes_are_a_failure() {
    let source = fixture(
        r#"["unit"]"#,
        r#"
[env.unit]
commands = ["echo 'unterminated", "echo never"]
"#,
    );
    let matrix = run_fixture(&source, Selection::All).await;
    let unit = matrix.get("unit").unwrap();

    assert_eq!(unit.outcome, Outcome::Failed);
    assert_eq!(unit.commands.len(), 1);
    assert!(unit.commands[0].stderr.contains("unbalanced quotes"));
}

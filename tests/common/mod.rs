// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tokio_util::sync::CancellationToken;

use env_matrix::core::config::parse_config;
use env_matrix::core::execution::{RunContext, run_matrix};
use env_matrix::core::models::MatrixResult;
use env_matrix::core::planner::Selection;
use env_matrix::infra::env::EnvSnapshot;

/// Matrix settings shared by the fixtures: no context materialisation step,
/// no package installation, `sh` as the interpreter.
pub const FIXTURE_HEADER: &str = r#"
[matrix]
create_command = ""
jobs = 4

[defaults]
interpreter = "sh"
skip_install = true
"#;

/// Builds a fixture from `[matrix].envs` plus extra sections.
pub fn fixture(envs: &str, sections: &str) -> String {
    let header = FIXTURE_HEADER.replace("[matrix]\n", &format!("[matrix]\nenvs = {envs}\n"));
    format!("{header}\n{sections}")
}

/// Writes `content` as `EnvMatrix.toml` inside `dir` and returns its path.
pub fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("EnvMatrix.toml");
    fs::write(&path, content).expect("Failed to write EnvMatrix.toml");
    path
}

/// A project directory with a `sub` directory, for `changedir` tests.
pub fn setup_project() -> TempDir {
    let dir = tempdir().expect("Failed to create temporary directory");
    fs::create_dir_all(dir.path().join("sub")).expect("Failed to create sub directory");
    dir
}

pub fn run_context(root: &Path) -> RunContext {
    RunContext::new(root.to_path_buf(), EnvSnapshot::capture())
}

/// Parses `source` and runs `selection` with the given context.
pub async fn run_with(
    source: &str,
    selection: Selection,
    ctx: RunContext,
    cancel: CancellationToken,
) -> MatrixResult {
    let config = parse_config(source).expect("fixture must parse");
    run_matrix(Arc::new(config), &selection, ctx, 4, cancel)
        .await
        .expect("selection must be valid")
}

/// Parses `source` and runs `selection` in a fresh project directory.
pub async fn run_fixture(source: &str, selection: Selection) -> MatrixResult {
    let project = setup_project();
    run_with(
        source,
        selection,
        run_context(project.path()),
        CancellationToken::new(),
    )
    .await
}

//! # File System Operations Module / 文件系统操作模块
//!
//! Creates the ephemeral directory that backs one environment's isolated
//! context. The directory is removed when the `EnvContext` is dropped.
//!
//! 创建支撑单个环境隔离上下文的临时目录。`EnvContext` 被丢弃时目录会被删除。

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory holding executables inside a context.
#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

/// The on-disk part of an isolated execution context.
/// 隔离执行上下文在磁盘上的部分。
pub struct EnvContext {
    /// The `TempDir` guard. When this goes out of scope, the directory on disk is deleted.
    /// `TempDir` 的 guard。当它超出作用域时，磁盘上的目录将被删除。
    _temp_root: TempDir,
    /// Where the interpreter environment is materialised / 解释器环境所在目录
    pub envdir: PathBuf,
    /// Executables of the context, prepended to `PATH` / 上下文的可执行文件目录，会被加到 `PATH` 前
    pub bindir: PathBuf,
    /// Scratch space exposed as `{envtmpdir}` / 以 `{envtmpdir}` 暴露的临时空间
    pub tmpdir: PathBuf,
}

impl EnvContext {
    /// Creates a fresh, empty context for the environment `env_name`.
    /// 为环境 `env_name` 创建一个全新的空上下文。
    pub fn create(env_name: &str) -> Result<Self> {
        let temp_root = tempfile::Builder::new()
            .prefix(&format!("env_matrix_{}_", sanitize(env_name)))
            .tempdir()
            .context("Failed to create temporary context directory")?;

        let envdir = temp_root.path().join("env");
        let tmpdir = temp_root.path().join("tmp");
        fs::create_dir_all(&tmpdir)
            .with_context(|| format!("Failed to create {}", tmpdir.display()))?;

        Ok(Self {
            bindir: envdir.join(BIN_DIR),
            envdir,
            tmpdir,
            _temp_root: temp_root,
        })
    }

    /// Makes sure `envdir` and `bindir` exist. Used when no create command
    /// populates the context.
    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(&self.bindir)
            .with_context(|| format!("Failed to create {}", self.bindir.display()))
    }

    pub fn root(&self) -> &Path {
        self._temp_root.path()
    }
}

impl fmt::Debug for EnvContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvContext")
            .field("envdir", &self.envdir)
            .finish_non_exhaustive()
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Resolves the directory commands run in: `changedir` relative to `root`,
/// or `root` itself.
///
/// 解析命令运行的目录：相对于 `root` 的 `changedir`，或 `root` 本身。
pub fn working_dir(root: &Path, changedir: Option<&Path>) -> PathBuf {
    match changedir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    }
}

/// Gets the absolute path from a potentially relative path.
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

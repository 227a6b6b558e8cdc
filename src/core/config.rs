//! # Configuration Module / 配置模块
//!
//! Parses the declarative environment matrix (`EnvMatrix.toml`) into an
//! immutable `MatrixConfig`. The file has three parts:
//!
//! - `[matrix]` declares the environments (`envs`), the default run list
//!   (`envlist`) and matrix-wide settings;
//! - `[defaults]` holds settings shared by every environment;
//! - `[env.<name>]` overrides settings for a single environment.
//!
//! Brace shorthand in `envs` and `envlist` is expanded here, once.
//!
//! 将声明式环境矩阵（`EnvMatrix.toml`）解析为不可变的 `MatrixConfig`。
//! 文件由三部分组成：`[matrix]` 声明环境、默认运行列表和矩阵级设置；
//! `[defaults]` 保存所有环境共享的设置；`[env.<name>]` 覆盖单个环境的设置。
//! `envs` 和 `envlist` 中的花括号简写在此处一次性展开。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::core::error::ConfigError;
use crate::core::expand;
use crate::core::interpreter::{DEFAULT_INTERPRETER, InterpreterSelector};

/// Default template used to materialise an isolated context.
pub const DEFAULT_CREATE_COMMAND: &str = "{interpreter} -m venv {envdir}";

/// Default template used to install dependencies into a context.
pub const DEFAULT_INSTALL_COMMAND: &str = "{envbindir}/python -m pip install {packages}";

/// A list written either as a TOML array or as one comma separated string.
/// 以 TOML 数组或逗号分隔字符串书写的列表。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ListValue {
    Many(Vec<String>),
    One(String),
}

impl ListValue {
    /// Returns the individual items, splitting comma separated strings.
    pub fn items(&self) -> Vec<String> {
        match self {
            ListValue::Many(items) => items.iter().flat_map(|i| expand::split_list(i)).collect(),
            ListValue::One(item) => expand::split_list(item),
        }
    }
}

/// The `[matrix]` table as written in the file.
/// 文件中书写的 `[matrix]` 表。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawMatrix {
    /// Output language for the runner's messages (e.g. "en", "zh-CN").
    /// 运行器输出消息的语言。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Every declared environment, in declared order.
    /// 所有已声明的环境，按声明顺序排列。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envs: Option<ListValue>,
    /// The default run list. Defaults to every declared environment.
    /// 默认运行列表。默认为所有已声明的环境。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envlist: Option<ListValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_missing_interpreters: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

/// Settings of `[defaults]` or of one `[env.<name>]` section. Every field is
/// optional; an environment section falls back to `[defaults]` field by field.
///
/// `[defaults]` 或某个 `[env.<name>]` 段的设置。每个字段都是可选的；
/// 环境段会逐字段回退到 `[defaults]`。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "basepython", skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenv: Option<ListValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<ListValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_install: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changedir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setenv: Option<BTreeMap<String, String>>,
}

impl RawSection {
    /// Overlays `self` on top of `base`: fields set in `self` win.
    fn overlay(&self, base: &RawSection) -> RawSection {
        RawSection {
            description: self.description.clone().or_else(|| base.description.clone()),
            interpreter: self.interpreter.clone().or_else(|| base.interpreter.clone()),
            commands: self.commands.clone().or_else(|| base.commands.clone()),
            passenv: self.passenv.clone().or_else(|| base.passenv.clone()),
            deps: self.deps.clone().or_else(|| base.deps.clone()),
            extras: self.extras.clone().or_else(|| base.extras.clone()),
            install_command: self
                .install_command
                .clone()
                .or_else(|| base.install_command.clone()),
            skip_install: self.skip_install.or(base.skip_install),
            ignore_errors: self.ignore_errors.or(base.ignore_errors),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
            changedir: self.changedir.clone().or_else(|| base.changedir.clone()),
            setenv: self.setenv.clone().or_else(|| base.setenv.clone()),
        }
    }
}

/// The configuration file as written, before validation.
/// 验证之前按原样书写的配置文件。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub matrix: RawMatrix,
    #[serde(default)]
    pub defaults: RawSection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, RawSection>,
}

/// Matrix-wide settings.
/// 矩阵级设置。
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSettings {
    /// Output language, if the file pins one / 文件指定的输出语言（如有）
    pub language: Option<String>,
    pub create_command: String,
    pub skip_missing_interpreters: bool,
    pub jobs: Option<usize>,
}

/// A single, fully resolved environment of the matrix.
/// 矩阵中一个已完全解析的环境。
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentSpec {
    /// Unique identifier within the matrix / 矩阵内的唯一标识符
    pub name: String,
    pub description: Option<String>,
    /// Interpreter the context is built from / 构建上下文所用的解释器
    pub interpreter: InterpreterSelector,
    /// Commands executed verbatim, in order / 按顺序原样执行的命令
    pub commands: Vec<String>,
    /// Variable name patterns passed through from the invoker / 从调用者透传的变量名模式
    pub passenv: Vec<String>,
    /// Variables set explicitly inside the context / 在上下文中显式设置的变量
    pub setenv: BTreeMap<String, String>,
    /// Plain dependency specifiers / 普通依赖说明符
    pub deps: Vec<String>,
    /// Extra dependency groups of the project under test / 被测项目的额外依赖组
    pub extras: Vec<String>,
    pub install_command: String,
    /// If `true`, the project itself is not installed / 为 `true` 时不安装项目本身
    pub skip_install: bool,
    /// If `true`, failing commands do not halt the sequence or the matrix.
    /// 为 `true` 时，失败的命令不会中止命令序列，也不会影响矩阵结果。
    pub ignore_errors: bool,
    /// Per-command timeout / 每条命令的超时时间
    pub timeout_secs: Option<u64>,
    /// Working directory for commands, relative to the project root.
    pub changedir: Option<PathBuf>,
    /// Member of the default run list / 是否属于默认运行列表
    pub in_default_run: bool,
}

impl EnvironmentSpec {
    /// Resolves one environment. `own` is its `[env.<name>]` section, if any;
    /// the interpreter comes from `own`, then the name, then `defaults`.
    fn resolve(
        name: &str,
        own: Option<&RawSection>,
        defaults: &RawSection,
        in_default_run: bool,
    ) -> Result<Self, ConfigError> {
        let explicit = |section: &RawSection| {
            section
                .interpreter
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(InterpreterSelector::parse)
        };
        let interpreter = own
            .and_then(explicit)
            .or_else(|| InterpreterSelector::from_env_name(name))
            .or_else(|| explicit(defaults))
            .unwrap_or_else(|| InterpreterSelector::parse(DEFAULT_INTERPRETER));

        let section = match own {
            Some(own) => own.overlay(defaults),
            None => defaults.clone(),
        };
        let section = &section;

        if section.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                env: name.to_string(),
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            description: section.description.clone(),
            interpreter,
            commands: section.commands.clone().unwrap_or_default(),
            passenv: section.passenv.as_ref().map(ListValue::items).unwrap_or_default(),
            setenv: section.setenv.clone().unwrap_or_default(),
            deps: section.deps.clone().unwrap_or_default(),
            extras: section.extras.as_ref().map(ListValue::items).unwrap_or_default(),
            install_command: section
                .install_command
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTALL_COMMAND.to_string()),
            skip_install: section.skip_install.unwrap_or(false),
            ignore_errors: section.ignore_errors.unwrap_or(false),
            timeout_secs: section.timeout_secs,
            changedir: section.changedir.clone(),
            in_default_run,
        })
    }
}

/// The complete, validated environment matrix. Immutable once parsed.
/// 完整且已验证的环境矩阵。解析后不可变。
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixConfig {
    pub settings: MatrixSettings,
    /// Declared environments in declared order / 按声明顺序排列的环境
    pub environments: Vec<EnvironmentSpec>,
    /// The default run list, expanded / 展开后的默认运行列表
    pub envlist: Vec<String>,
}

impl MatrixConfig {
    pub fn get(&self, name: &str) -> Option<&EnvironmentSpec> {
        self.environments.iter().find(|env| env.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.environments.iter().map(|env| env.name.as_str())
    }
}

/// Parses and validates a matrix configuration.
///
/// # Errors
/// Returns a `ConfigError` when the text is not valid TOML, a brace pattern is
/// malformed, an environment is declared twice, an `[env.*]` section names an
/// undeclared environment, or the default run list references an undefined
/// environment.
///
/// 解析并验证矩阵配置。当文本不是合法的 TOML、花括号模式格式错误、
/// 环境被重复声明、`[env.*]` 段引用了未声明的环境，或默认运行列表
/// 引用了未定义的环境时，返回 `ConfigError`。
pub fn parse_config(source: &str) -> Result<MatrixConfig, ConfigError> {
    let raw: RawConfig = toml::from_str(source)?;
    MatrixConfig::try_from(raw)
}

impl TryFrom<RawConfig> for MatrixConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let declared = match &raw.matrix.envs {
            Some(envs) => expand::expand_list(&envs.items())?,
            None => Vec::new(),
        };
        if declared.is_empty() {
            return Err(ConfigError::NoEnvironments);
        }

        let mut seen = HashSet::new();
        for name in &declared {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateEnvironment(name.clone()));
            }
        }

        if let Some(section) = raw.env.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(ConfigError::UndeclaredSection(section.clone()));
        }

        let envlist = match &raw.matrix.envlist {
            Some(list) => {
                let mut envlist: Vec<String> = Vec::new();
                for name in expand::expand_list(&list.items())? {
                    if !seen.contains(name.as_str()) {
                        return Err(ConfigError::UndefinedEnvironment(name));
                    }
                    if !envlist.contains(&name) {
                        envlist.push(name);
                    }
                }
                envlist
            }
            None => declared.clone(),
        };

        let environments = declared
            .iter()
            .map(|name| {
                EnvironmentSpec::resolve(
                    name,
                    raw.env.get(name),
                    &raw.defaults,
                    envlist.contains(name),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if raw.matrix.jobs == Some(0) {
            return Err(ConfigError::InvalidValue {
                env: "matrix".to_string(),
                field: "jobs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let settings = MatrixSettings {
            language: raw.matrix.language,
            create_command: raw
                .matrix
                .create_command
                .unwrap_or_else(|| DEFAULT_CREATE_COMMAND.to_string()),
            skip_missing_interpreters: raw.matrix.skip_missing_interpreters,
            jobs: raw.matrix.jobs,
        };

        Ok(MatrixConfig {
            settings,
            environments,
            envlist,
        })
    }
}

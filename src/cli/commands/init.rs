//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command of the env-matrix CLI. It
//! writes a starter `EnvMatrix.toml`, either from a built-in template or
//! through an interactive wizard.
//!
//! 此模块实现了 env-matrix CLI 的 `init` 命令。它通过内置模板或交互式向导
//! 写出一个初始的 `EnvMatrix.toml`。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::config::{ListValue, RawConfig, RawMatrix, RawSection, parse_config};
use crate::infra::t;

/// The configuration written by `init --non-interactive`.
pub const DEFAULT_CONFIG: &str = r#"# Environment Matrix Configuration / 环境矩阵配置

[matrix]
# Declared environments, in run order. Braces expand: py{38,39} -> py38, py39
# 已声明的环境，按运行顺序排列。花括号会展开：py{38,39} -> py38, py39
envs = ["py{38,39,310,311}", "quality"]
# Environments run when no -e option is given / 未指定 -e 时运行的环境
envlist = "py{38,39,310,311}"
# Record a missing interpreter as skipped instead of errored
# 将缺失的解释器记录为跳过，而不是出错
skip_missing_interpreters = true

[defaults]
# Variables passed through from the calling shell / 从调用者 shell 透传的变量
passenv = ["CI", "HOME"]
deps = ["pytest"]
commands = ["pytest {posargs}"]

[env.quality]
description = "import sorting and formatting checks"
interpreter = "python3"
ignore_errors = true
skip_install = true
deps = ["isort", "black"]
commands = ["isort --diff --check-only .", "black --check ."]
"#;

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path of the configuration file to write
/// * `non_interactive` - Write `DEFAULT_CONFIG` without prompting
/// * `force` - Overwrite an existing file
/// * `language` - Language of the prompts
pub fn execute(output: &Path, non_interactive: bool, force: bool, language: &str) -> Result<()> {
    let theme = ColorfulTheme::default();

    if output.exists() && !force {
        if non_interactive {
            anyhow::bail!(
                "{}",
                t!("init_file_exists", locale = language, path = output.display())
            );
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init_overwrite_prompt", locale = language, path = output.display()))
            .default(false)
            .interact()
            .context(t!("init_user_confirmation_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init_aborted", locale = language));
            return Ok(());
        }
    }

    let contents = if non_interactive {
        DEFAULT_CONFIG.to_string()
    } else {
        println!("\n{}", t!("init_wizard_welcome", locale = language).cyan().bold());
        println!("{}", t!("init_wizard_description", locale = language));
        let config = run_wizard(&theme, language)?;
        toml::to_string_pretty(&config)
            .context(t!("init_serialize_failed", locale = language).to_string())?
    };

    write_config(output, &contents, language)
}

/// Asks for the interpreters and the optional environments to generate.
fn run_wizard(theme: &ColorfulTheme, language: &str) -> Result<RawConfig> {
    let interpreters: String = Input::with_theme(theme)
        .with_prompt(t!("init_interpreters_prompt", locale = language))
        .default("py{39,310,311,312}".to_string())
        .interact_text()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;

    let test_command: String = Input::with_theme(theme)
        .with_prompt(t!("init_test_command_prompt", locale = language))
        .default("pytest {posargs}".to_string())
        .interact_text()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;

    let options = [
        ("quality", t!("init_template_quality", locale = language)),
        ("docs", t!("init_template_docs", locale = language)),
    ];
    let selections = MultiSelect::with_theme(theme)
        .with_prompt(t!("init_extra_envs_prompt", locale = language))
        .items(&options.iter().map(|o| o.1.clone()).collect::<Vec<_>>())
        .interact()
        .context(t!("init_user_confirmation_failed", locale = language).to_string())?;

    let extra: Vec<&str> = selections.iter().map(|&i| options[i].0).collect();
    Ok(wizard_config(&interpreters, &test_command, &extra, language))
}

/// Builds the configuration produced by the wizard's answers.
/// 根据向导的回答构建配置。
pub fn wizard_config(
    interpreters: &str,
    test_command: &str,
    extra_envs: &[&str],
    language: &str,
) -> RawConfig {
    let mut envs = vec![interpreters.trim().to_string()];
    let mut sections = BTreeMap::new();

    for name in extra_envs {
        let section = match *name {
            "quality" => RawSection {
                description: Some("import sorting and formatting checks".to_string()),
                interpreter: Some("python3".to_string()),
                ignore_errors: Some(true),
                skip_install: Some(true),
                deps: Some(vec!["isort".to_string(), "black".to_string()]),
                commands: Some(vec![
                    "isort --diff --check-only .".to_string(),
                    "black --check .".to_string(),
                ]),
                ..RawSection::default()
            },
            "docs" => RawSection {
                description: Some("build the documentation".to_string()),
                interpreter: Some("python3".to_string()),
                deps: Some(vec!["sphinx".to_string()]),
                commands: Some(vec![
                    "sphinx-build -W -b html docs {envtmpdir}/html".to_string(),
                ]),
                ..RawSection::default()
            },
            _ => continue,
        };
        envs.push(name.to_string());
        sections.insert(name.to_string(), section);
    }

    RawConfig {
        matrix: RawMatrix {
            language: Some(language.to_string()),
            envs: Some(ListValue::Many(envs)),
            envlist: Some(ListValue::One(interpreters.trim().to_string())),
            skip_missing_interpreters: true,
            ..RawMatrix::default()
        },
        defaults: RawSection {
            passenv: Some(ListValue::Many(vec!["CI".to_string(), "HOME".to_string()])),
            deps: Some(vec!["pytest".to_string()]),
            commands: Some(vec![test_command.trim().to_string()]),
            ..RawSection::default()
        },
        env: sections,
    }
}

fn write_config(path: &Path, contents: &str, language: &str) -> Result<()> {
    // Refuse to write something `run` would reject.
    parse_config(contents).context(t!("init_serialize_failed", locale = language).to_string())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| t!("init_write_failed", locale = language, path = parent.display()).to_string())?;
    }
    fs::write(path, contents)
        .with_context(|| t!("init_write_failed", locale = language, path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init_success_created", locale = language, path = path.display()).bold()
    );
    println!("{}", t!("init_usage_hint", locale = language));

    Ok(())
}

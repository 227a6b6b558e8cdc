//! # Config Module Unit Tests / Config 模块单元测试
//!
//! This module contains unit tests for the `config.rs` module: parsing,
//! inheritance from `[defaults]`, interpreter precedence and validation.
//!
//! 此模块包含 `config.rs` 模块的单元测试：解析、从 `[defaults]` 继承、
//! 解释器优先级以及验证。

use env_matrix::cli::commands::init::{DEFAULT_CONFIG, wizard_config};
use env_matrix::core::config::{DEFAULT_CREATE_COMMAND, DEFAULT_INSTALL_COMMAND, parse_config};
use env_matrix::core::error::ConfigError;
use env_matrix::core::interpreter::InterpreterSelector;

const SAMPLE: &str = r#"
[matrix]
envs = ["py{36,37,38}", "quality"]
envlist = "py{36,37,38}"

[defaults]
passenv = ["CI", "TRAVIS", "TRAVIS_*"]
deps = ["codecov", "pytest-cov"]
extras = ["testing"]
commands = ["pytest --cov=cryptojwt {posargs}", "codecov"]

[env.quality]
interpreter = "python3.7"
ignore_errors = true
extras = ["quality"]
commands = ["isort --diff --check-only src tests", "black --check src tests"]
"#;

#[cfg(test)]
mod parsing_tests {
    use super::*;

    #[test]
    fn test_sample_declares_environments_in_order() {
        let config = parse_config(SAMPLE).unwrap();
        let names: Vec<&str> = config.names().collect();
        assert_eq!(names, vec!["py36", "py37", "py38", "quality"]);
        assert_eq!(config.envlist, vec!["py36", "py37", "py38"]);
    }

    #[test]
    fn test_default_run_membership() {
        let config = parse_config(SAMPLE).unwrap();
        assert!(config.get("py37").unwrap().in_default_run);
        assert!(!config.get("quality").unwrap().in_default_run);
    }

    #[test]
    fn test_defaults_are_inherited() {
        let config = parse_config(SAMPLE).unwrap();
        let py36 = config.get("py36").unwrap();
        assert_eq!(py36.passenv, vec!["CI", "TRAVIS", "TRAVIS_*"]);
        assert_eq!(py36.deps, vec!["codecov", "pytest-cov"]);
        assert_eq!(py36.extras, vec!["testing"]);
        assert_eq!(py36.commands.len(), 2);
        assert!(!py36.ignore_errors);
        assert_eq!(py36.install_command, DEFAULT_INSTALL_COMMAND);
        assert_eq!(config.settings.create_command, DEFAULT_CREATE_COMMAND);
    }

    #[test]
    fn test_section_overrides_field_by_field() {
        let config = parse_config(SAMPLE).unwrap();
        let quality = config.get("quality").unwrap();
        assert!(quality.ignore_errors);
        assert_eq!(quality.extras, vec!["quality"]);
        assert_eq!(
            quality.commands,
            vec!["isort --diff --check-only src tests", "black --check src tests"]
        );
        // Not overridden, so inherited.
        assert_eq!(quality.deps, vec!["codecov", "pytest-cov"]);
    }

    #[test]
    fn test_envlist_defaults_to_every_environment() {
        let config = parse_config(
            r#"
[matrix]
envs = "lint, docs"
"#,
        )
        .unwrap();
        assert_eq!(config.envlist, vec!["lint", "docs"]);
        assert!(config.environments.iter().all(|e| e.in_default_run));
    }

    #[test]
    fn test_comma_separated_strings_are_lists() {
        let config = parse_config(
            r#"
[matrix]
envs = "py{37,38}-django{2,3}, lint"

[defaults]
passenv = "CI, HOME"
"#,
        )
        .unwrap();
        let names: Vec<&str> = config.names().collect();
        assert_eq!(
            names,
            vec!["py37-django2", "py37-django3", "py38-django2", "py38-django3", "lint"]
        );
        assert_eq!(config.get("lint").unwrap().passenv, vec!["CI", "HOME"]);
    }

    #[test]
    fn test_setenv_changedir_and_timeout() {
        let config = parse_config(
            r#"
[matrix]
envs = ["unit"]
jobs = 3
skip_missing_interpreters = true
language = "zh-CN"

[env.unit]
setenv = { PYTHONHASHSEED = "0" }
changedir = "tests"
timeout_secs = 30
"#,
        )
        .unwrap();
        let unit = config.get("unit").unwrap();
        assert_eq!(unit.setenv.get("PYTHONHASHSEED").map(String::as_str), Some("0"));
        assert_eq!(unit.changedir.as_deref(), Some(std::path::Path::new("tests")));
        assert_eq!(unit.timeout_secs, Some(30));
        assert_eq!(config.settings.jobs, Some(3));
        assert!(config.settings.skip_missing_interpreters);
        assert_eq!(config.settings.language.as_deref(), Some("zh-CN"));
    }
}

#[cfg(test)]
mod interpreter_precedence_tests {
    use super::*;

    #[test]
    fn test_explicit_interpreter_wins() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(
            config.get("quality").unwrap().interpreter,
            InterpreterSelector::Executable("python3.7".to_string())
        );
    }

    #[test]
    fn test_name_factor_beats_defaults() {
        let config = parse_config(
            r#"
[matrix]
envs = ["py38-lint", "docs"]

[defaults]
interpreter = "3.11"
"#,
        )
        .unwrap();
        assert_eq!(
            config.get("py38-lint").unwrap().interpreter,
            InterpreterSelector::Tag("py38".to_string())
        );
        assert_eq!(
            config.get("docs").unwrap().interpreter,
            InterpreterSelector::Version("3.11".to_string())
        );
    }

    #[test]
    fn test_fallback_is_python3() {
        let config = parse_config("[matrix]\nenvs = [\"docs\"]\n").unwrap();
        assert_eq!(
            config.get("docs").unwrap().interpreter,
            InterpreterSelector::Executable("python3".to_string())
        );
    }

    #[test]
    fn test_basepython_alias() {
        let config = parse_config(
            r#"
[matrix]
envs = ["docs"]

[env.docs]
basepython = "pypy3"
"#,
        )
        .unwrap();
        assert_eq!(
            config.get("docs").unwrap().interpreter,
            InterpreterSelector::Tag("pypy3".to_string())
        );
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_malformed_toml() {
        let err = parse_config("[matrix\nenvs = [").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax(_)));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = parse_config("[matrix]\nenvs = [\"a\"]\n\n[defaults]\ncomands = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax(_)));
    }

    #[test]
    fn test_no_environments() {
        assert!(matches!(
            parse_config("[matrix]\n").unwrap_err(),
            ConfigError::NoEnvironments
        ));
    }

    #[test]
    fn test_duplicate_identifier() {
        let err = parse_config("[matrix]\nenvs = [\"py{36,37}\", \"py36\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEnvironment(name) if name == "py36"));
    }

    #[test]
    fn test_section_for_undeclared_environment() {
        let err = parse_config("[matrix]\nenvs = [\"a\"]\n\n[env.b]\ncommands = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::UndeclaredSection(name) if name == "b"));
    }

    #[test]
    fn test_envlist_references_undefined_environment() {
        let err = parse_config("[matrix]\nenvs = [\"py{36,37}\"]\nenvlist = \"py{36,38}\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedEnvironment(name) if name == "py38"));
    }

    #[test]
    fn test_malformed_brace_pattern() {
        let err = parse_config("[matrix]\nenvs = [\"py{36,37\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn test_empty_braces_do_not_declare_a_nameless_environment() {
        let err = parse_config("[matrix]\nenvs = [\"{}\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }

    #[test]
    fn test_zero_timeout_and_jobs() {
        let err = parse_config("[matrix]\nenvs = [\"a\"]\n\n[env.a]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "timeout_secs", .. }));

        let err = parse_config("[matrix]\nenvs = [\"a\"]\njobs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "jobs", .. }));
    }
}

#[cfg(test)]
mod init_template_tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert!(config.contains("quality"));
        assert_eq!(config.envlist, vec!["py38", "py39", "py310", "py311"]);
        assert!(config.settings.skip_missing_interpreters);
    }

    #[test]
    fn test_wizard_config_serializes_to_a_valid_file() {
        let raw = wizard_config("py{311,312}", "pytest -q {posargs}", &["quality", "docs"], "en");
        let text = toml::to_string_pretty(&raw).unwrap();
        let config = parse_config(&text).unwrap();

        let names: Vec<&str> = config.names().collect();
        assert_eq!(names, vec!["py311", "py312", "quality", "docs"]);
        assert_eq!(config.envlist, vec!["py311", "py312"]);
        assert_eq!(config.get("py312").unwrap().commands, vec!["pytest -q {posargs}"]);
        assert!(config.get("quality").unwrap().ignore_errors);
    }
}

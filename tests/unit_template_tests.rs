//! # Command Template Unit Tests / 命令模板单元测试
//!
//! Tests placeholder substitution, `$VAR` expansion against the context
//! environment and shell-style splitting.
//!
//! 测试占位符替换、依据上下文环境展开 `$VAR` 以及按 shell 规则拆分。

use std::collections::BTreeMap;
use std::path::PathBuf;

use env_matrix::core::template::{Placeholders, TemplateError, render_argv, render_line};

struct Dirs {
    envdir: PathBuf,
    bindir: PathBuf,
    tmpdir: PathBuf,
    root: PathBuf,
    interpreter: PathBuf,
}

impl Dirs {
    fn new() -> Self {
        Self {
            envdir: PathBuf::from("/ctx/env"),
            bindir: PathBuf::from("/ctx/env/bin"),
            tmpdir: PathBuf::from("/ctx/tmp"),
            root: PathBuf::from("/work/project dir"),
            interpreter: PathBuf::from("/usr/bin/python3.8"),
        }
    }

    fn placeholders<'a>(&'a self, posargs: &'a [String], packages: &'a [String]) -> Placeholders<'a> {
        Placeholders {
            envname: "py38",
            envdir: &self.envdir,
            envbindir: &self.bindir,
            envtmpdir: &self.tmpdir,
            rootdir: &self.root,
            interpreter: Some(&self.interpreter),
            posargs,
            packages,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod substitution_tests {
    use super::*;

    #[test]
    fn test_directory_placeholders() {
        let dirs = Dirs::new();
        let argv = render_argv(
            "{interpreter} -m venv {envdir} --prompt {envname}",
            &dirs.placeholders(&[], &[]),
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(
            argv,
            strings(&["/usr/bin/python3.8", "-m", "venv", "/ctx/env", "--prompt", "py38"])
        );
    }

    #[test]
    fn test_paths_with_spaces_stay_one_argument() {
        let dirs = Dirs::new();
        let argv = render_argv("ls {rootdir}", &dirs.placeholders(&[], &[]), &BTreeMap::new()).unwrap();
        assert_eq!(argv, strings(&["ls", "/work/project dir"]));
    }

    #[test]
    fn test_posargs_are_quoted_before_splitting() {
        let dirs = Dirs::new();
        let posargs = strings(&["-k", "test one"]);
        let argv = render_argv("pytest {posargs}", &dirs.placeholders(&posargs, &[]), &BTreeMap::new()).unwrap();
        assert_eq!(argv, strings(&["pytest", "-k", "test one"]));
    }

    #[test]
    fn test_posargs_default() {
        let dirs = Dirs::new();
        let template = "pytest {posargs:tests -q}";

        let argv = render_argv(template, &dirs.placeholders(&[], &[]), &BTreeMap::new()).unwrap();
        assert_eq!(argv, strings(&["pytest", "tests", "-q"]));

        let posargs = strings(&["unit"]);
        let argv = render_argv(template, &dirs.placeholders(&posargs, &[]), &BTreeMap::new()).unwrap();
        assert_eq!(argv, strings(&["pytest", "unit"]));
    }

    #[test]
    fn test_packages_expand_to_several_arguments() {
        let dirs = Dirs::new();
        let packages = strings(&["pytest-cov", "/work/project dir[testing]"]);
        let argv = render_argv(
            "{envbindir}/python -m pip install {packages}",
            &dirs.placeholders(&[], &packages),
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(
            argv,
            strings(&[
                "/ctx/env/bin/python",
                "-m",
                "pip",
                "install",
                "pytest-cov",
                "/work/project dir[testing]"
            ])
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let dirs = Dirs::new();
        assert_eq!(
            render_line("echo {envname} {nope}", &dirs.placeholders(&[], &[]), &BTreeMap::new()).unwrap(),
            "echo py38 {nope}"
        );
    }
}

#[cfg(test)]
mod variable_tests {
    use super::*;

    #[test]
    fn test_variables_come_from_the_context_only() {
        let dirs = Dirs::new();
        let mut env = BTreeMap::new();
        env.insert("GREETING".to_string(), "hello world".to_string());

        let argv = render_argv(
            "echo \"$GREETING\" ${GREETING} $NOT_IN_CONTEXT",
            &dirs.placeholders(&[], &[]),
            &env,
        )
        .unwrap();
        assert_eq!(
            argv,
            strings(&["echo", "hello world", "hello", "world", "$NOT_IN_CONTEXT"])
        );
    }

    #[test]
    fn test_single_quoted_text_is_literal() {
        let dirs = Dirs::new();
        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), "/ctx/env/bin:/usr/bin".to_string());

        let argv = render_argv(
            "echo 'price: $PATH' \"$PATH\"",
            &dirs.placeholders(&[], &[]),
            &env,
        )
        .unwrap();
        assert_eq!(argv, strings(&["echo", "price: $PATH", "/ctx/env/bin:/usr/bin"]));
    }

    #[test]
    fn test_substituted_values_are_not_expanded() {
        let mut dirs = Dirs::new();
        dirs.root = PathBuf::from("/work/$HOME");
        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), "/ctx/env/bin".to_string());
        env.insert("HOME".to_string(), "/home/user".to_string());

        let posargs = strings(&["cost=$PATH", "${HOME}"]);
        let argv = render_argv(
            "echo {posargs} {rootdir} $HOME",
            &dirs.placeholders(&posargs, &[]),
            &env,
        )
        .unwrap();
        assert_eq!(
            argv,
            strings(&["echo", "cost=$PATH", "${HOME}", "/work/$HOME", "/home/user"])
        );
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_unbalanced_quotes() {
        let dirs = Dirs::new();
        let err = render_argv("echo 'oops", &dirs.placeholders(&[], &[]), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::UnbalancedQuotes(_)));
    }

    #[test]
    fn test_empty_after_substitution() {
        let dirs = Dirs::new();
        let err = render_argv("{posargs}", &dirs.placeholders(&[], &[]), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Empty(_)));
    }
}

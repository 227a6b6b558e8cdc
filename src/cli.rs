//! # CLI Module / 命令行模块
//!
//! Builds the `env-matrix` command line with localized help texts and
//! dispatches to the `run`, `list` and `init` commands. Invoking the binary
//! without a subcommand behaves like `run`.
//!
//! 构建带有本地化帮助文本的 `env-matrix` 命令行，并分派到 `run`、`list` 和
//! `init` 命令。不带子命令调用时等同于 `run`。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::infra::{logging, t};
use commands::run::RunOptions;

/// Default configuration file name / 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "EnvMatrix.toml";

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    for (pos, arg) in args.iter().enumerate() {
        if arg == "--" {
            break;
        }
        if arg == "--lang" {
            return args.get(pos + 1).cloned();
        }
        if let Some(lang) = arg.strip_prefix("--lang=") {
            return Some(lang.to_string());
        }
    }
    None
}

/// Arguments shared by the implicit and the explicit `run` command.
fn run_args(locale: &str) -> Vec<Arg> {
    vec![
        Arg::new("config")
            .short('c')
            .long("config")
            .help(t!("arg_config", locale = locale).to_string())
            .value_name("FILE")
            .default_value(DEFAULT_CONFIG_FILE)
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
        Arg::new("env")
            .short('e')
            .long("env")
            .help(t!("arg_env", locale = locale).to_string())
            .value_name("ENVS")
            .action(ArgAction::Append),
        Arg::new("jobs")
            .short('j')
            .long("jobs")
            .help(t!("arg_jobs", locale = locale).to_string())
            .value_name("JOBS")
            .value_parser(clap::value_parser!(usize))
            .action(ArgAction::Set),
        Arg::new("root")
            .long("root")
            .help(t!("arg_root", locale = locale).to_string())
            .value_name("DIR")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
        Arg::new("skip-missing-interpreters")
            .long("skip-missing-interpreters")
            .help(t!("arg_skip_missing", locale = locale).to_string())
            .action(ArgAction::SetTrue),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help(t!("arg_verbose", locale = locale).to_string())
            .action(ArgAction::Count),
        Arg::new("html")
            .long("html")
            .help(t!("arg_html", locale = locale).to_string())
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
        Arg::new("json")
            .long("json")
            .help(t!("arg_json", locale = locale).to_string())
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .action(ArgAction::Set),
        Arg::new("posargs")
            .help(t!("arg_posargs", locale = locale).to_string())
            .value_name("POSARGS")
            .num_args(0..)
            .last(true)
            .action(ArgAction::Append),
    ]
}

/// Builds the command line definition with help texts in `locale`.
/// 使用 `locale` 语言的帮助文本构建命令行定义。
pub fn build_cli(locale: &str) -> Command {
    Command::new("env-matrix")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .args(run_args(locale))
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .args(run_args(locale)),
        )
        .subcommand(
            Command::new("list")
                .about(t!("cmd_list_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("FILE")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .help(t!("arg_list_all", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_output", locale = locale).to_string())
                        .value_name("FILE")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
}

fn run_options(matches: &ArgMatches, lang: Option<String>) -> RunOptions {
    RunOptions {
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        root: matches.get_one::<PathBuf>("root").cloned(),
        envs: matches
            .get_many::<String>("env")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        skip_missing_interpreters: matches.get_flag("skip-missing-interpreters"),
        verbose: matches.get_count("verbose"),
        html: matches.get_one::<PathBuf>("html").cloned(),
        json: matches.get_one::<PathBuf>("json").cloned(),
        posargs: matches
            .get_many::<String>("posargs")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        lang,
    }
}

/// Parses the command line and runs the selected command.
/// 解析命令行并运行所选命令。
pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    let language = crate::resolve_locale(
        &requested.clone().unwrap_or_else(crate::detect_locale),
    );
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            logging::init_tracing(run_matches.get_count("verbose"));
            commands::run::execute(run_options(run_matches, requested)).await
        }
        Some(("list", list_matches)) => {
            logging::init_tracing(0);
            let config = list_matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            commands::list::execute(&config, list_matches.get_flag("all"), requested)
        }
        Some(("init", init_matches)) => {
            logging::init_tracing(0);
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

            // Show language detection message if it was auto-detected
            if requested.is_none() {
                println!(
                    "🌐 {}",
                    t!("system_language_detected", locale = &language, lang = &language)
                );
            }
            commands::init::execute(
                &output,
                init_matches.get_flag("non-interactive"),
                init_matches.get_flag("force"),
                &language,
            )
        }
        _ => {
            logging::init_tracing(matches.get_count("verbose"));
            commands::run::execute(run_options(&matches, requested)).await
        }
    }
}

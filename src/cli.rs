//! # Command-Line Interface Module / 命令行接口模块
//!
//! Builds the `spec-runner` command line, resolves the run configuration from
//! the settings file, the process environment and the arguments, and
//! dispatches to the commands.
//!
//! 构建 `spec-runner` 命令行，从设置文件、进程环境和参数解析运行配置，
//! 并分派给各个命令。

pub mod commands;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::{env, path::PathBuf};

use crate::core::config::{
    ConfigOverrides, EnvSnapshot, RunConfig, RunnerSettings, SETTINGS_FILE_NAME,
};
use crate::core::registry::Registry;
use crate::core::selector::Selection;
use crate::infra::t;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language(args: &[String]) -> Option<String> {
    args.iter().enumerate().find_map(|(pos, arg)| {
        if arg == "--lang" {
            args.get(pos + 1).cloned()
        } else {
            arg.strip_prefix("--lang=").map(str::to_string)
        }
    })
}

fn list_arg(id: &'static str, help: String, value_name: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .value_name(value_name)
        .num_args(1..)
        .action(ArgAction::Append)
}

fn workspace_args(command: Command, locale: &str) -> Command {
    command
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .help(t!("cli.arg_project", locale = locale).to_string())
                .value_name("PROJECT")
                .default_value("")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("workspace")
                .short('w')
                .long("workspace")
                .help(t!("cli.arg_workspace", locale = locale).to_string())
                .value_name("WORKSPACE")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("build-dir")
                .long("build-dir")
                .help(t!("cli.arg_build_dir", locale = locale).to_string())
                .value_name("BUILD_DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.arg_config", locale = locale).to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
}

fn selection_args(command: Command, locale: &str) -> Command {
    command
        .arg(list_arg(
            "tests",
            t!("cli.arg_tests", locale = locale).to_string(),
            "NAME",
        ))
        .arg(list_arg(
            "include",
            t!("cli.arg_include", locale = locale).to_string(),
            "TAG",
        ))
        .arg(list_arg(
            "exclude",
            t!("cli.arg_exclude", locale = locale).to_string(),
            "TAG",
        ))
        .arg(list_arg(
            "modules",
            t!("cli.arg_modules", locale = locale).to_string(),
            "MODULE",
        ))
        .arg(
            list_arg(
                "specs",
                t!("cli.arg_specs", locale = locale).to_string(),
                "SPEC_JSON",
            )
            .value_parser(clap::value_parser!(PathBuf)),
        )
}

/// Builds the full command line with help texts in `locale`.
/// 使用 `locale` 语言的帮助文本构建完整的命令行。
pub fn build_cli(locale: &str) -> Command {
    Command::new("spec-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            selection_args(
                workspace_args(
                    Command::new("run").about(t!("cli.cmd_run_about", locale = locale).to_string()),
                    locale,
                ),
                locale,
            )
            .arg(
                Arg::new("jobs")
                    .short('j')
                    .long("jobs")
                    .help(t!("cli.arg_jobs", locale = locale).to_string())
                    .value_name("JOBS")
                    .value_parser(clap::value_parser!(usize))
                    .action(ArgAction::Set),
            ),
        )
        .subcommand(selection_args(
            workspace_args(
                Command::new("collect")
                    .about(t!("cli.cmd_collect_about", locale = locale).to_string()),
                locale,
            ),
            locale,
        ))
        .subcommand(
            workspace_args(
                Command::new("show").about(t!("cli.cmd_show_about", locale = locale).to_string()),
                locale,
            )
            .arg(
                Arg::new("specid")
                    .long("specid")
                    .help(t!("cli.arg_specid", locale = locale).to_string())
                    .value_name("ID")
                    .required(true)
                    .action(ArgAction::Set),
            ),
        )
        .subcommand(
            workspace_args(
                Command::new("init").about(t!("cli.cmd_init_about", locale = locale).to_string()),
                locale,
            )
            .arg(
                Arg::new("non-interactive")
                    .long("non-interactive")
                    .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                    .action(ArgAction::SetTrue),
            ),
        )
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Reads the selection criteria of `run` and `collect`.
pub fn selection_from(matches: &ArgMatches) -> Selection {
    Selection {
        tests: strings(matches, "tests"),
        include: strings(matches, "include"),
        exclude: strings(matches, "exclude"),
        modules: strings(matches, "modules"),
        specs: matches
            .get_many::<PathBuf>("specs")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
    }
}

/// Resolves the run configuration of a subcommand.
///
/// The settings file is `--config`, or `spec-runner.toml` in the workspace
/// given by `--workspace` or `MY_WORKSPACE` (the current directory otherwise).
/// Without an explicit language the detected system language is kept.
///
/// 解析子命令的运行配置。
pub fn resolve_config(
    matches: &ArgMatches,
    env: &EnvSnapshot,
    explicit_lang: Option<String>,
    system_lang: &str,
) -> Result<RunConfig> {
    let workspace = matches.get_one::<PathBuf>("workspace").cloned();
    let settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunnerSettings::load(path)?,
        None => {
            let root = workspace
                .clone()
                .or_else(|| env.workspace.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            RunnerSettings::load_or_default(&root.join(SETTINGS_FILE_NAME))?
        }
    };

    let overrides = ConfigOverrides {
        project: matches
            .get_one::<String>("project")
            .cloned()
            .unwrap_or_default(),
        workspace,
        build_dir: matches.get_one::<PathBuf>("build-dir").cloned(),
        language: explicit_lang,
    };

    let mut config = RunConfig::resolve(&settings, env, &overrides)?;
    if overrides.language.is_none() && settings.language.is_none() {
        config.language = system_lang.to_string();
    }
    config.language = crate::set_language(&config.language);
    Ok(config)
}

/// Parses the process arguments and runs the chosen command with `registry`.
/// 解析进程参数并使用 `registry` 运行所选命令。
pub async fn run(registry: Registry) -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let explicit_lang = pre_parse_language(&args);
    let system_lang = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let language = crate::set_language(explicit_lang.as_deref().unwrap_or(&system_lang));

    let matches = build_cli(&language).get_matches_from(args);
    let env = EnvSnapshot::capture();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let config = resolve_config(run_matches, &env, explicit_lang, &system_lang)?;
            let jobs = run_matches.get_one::<usize>("jobs").copied();
            commands::run::execute(config, selection_from(run_matches), jobs, registry).await
        }
        Some(("collect", collect_matches)) => {
            let config = resolve_config(collect_matches, &env, explicit_lang, &system_lang)?;
            commands::collect::execute(&config, &selection_from(collect_matches), &registry)
        }
        Some(("show", show_matches)) => {
            let config = resolve_config(show_matches, &env, explicit_lang, &system_lang)?;
            let spec_id = show_matches
                .get_one::<String>("specid")
                .cloned()
                .unwrap_or_default();
            commands::show::execute(&config, &spec_id)
        }
        Some(("init", init_matches)) => {
            if explicit_lang.is_none() {
                println!(
                    "{}",
                    t!("init.language_detected", locale = &language, lang = &language).dimmed()
                );
            }
            let config = resolve_config(init_matches, &env, explicit_lang, &system_lang)?;
            commands::init::run_init_wizard(&config, init_matches.get_flag("non-interactive"))
        }
        // Clap has already printed the help for a missing subcommand.
        _ => Ok(()),
    }
}

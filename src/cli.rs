//! # Command-Line Interface / 命令行接口
//!
//! Argument parsing for the `run`, `refresh` and `init` commands. Help texts
//! are localized, so the language is resolved before the parser is built.
//!
//! `run`、`refresh` 和 `init` 命令的参数解析。帮助文本已本地化，
//! 因此在构建解析器之前先确定语言。

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::DEFAULT_CONFIG_FILE;
use crate::core::planner::Overrides;
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line to find an explicit `--lang <VALUE>`.
/// This allows i18n to be initialized before the full CLI is built.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--lang")
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("cli.arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value(DEFAULT_CONFIG_FILE)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn html_arg(locale: &str) -> Arg {
    Arg::new("html")
        .long("html")
        .help(t!("cli.arg_html", locale = locale).to_string())
        .value_name("HTML")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

/// Builds the full command tree with help texts in `locale`.
pub fn build_cli(locale: &str) -> Command {
    Command::new("shard-runner")
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
            Command::new("run")
                .about(t!("cli.cmd_run_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(
                    Arg::new("shards")
                        .short('s')
                        .long("shards")
                        .help(t!("cli.arg_shards", locale = locale).to_string())
                        .value_name("SHARDS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("wait")
                        .long("wait")
                        .help(t!("cli.arg_wait", locale = locale).to_string())
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-wait"),
                )
                .arg(
                    Arg::new("no-wait")
                        .long("no-wait")
                        .help(t!("cli.arg_no_wait", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(html_arg(locale)),
        )
        .subcommand(
            Command::new("refresh")
                .about(t!("cli.cmd_refresh_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(html_arg(locale)),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("cli.arg_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("cli.arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn path_arg(matches: &ArgMatches, id: &str) -> PathBuf {
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

/// Parses the command line and dispatches to the selected command.
pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_lang = pre_parse_language();
    let language = explicit_lang.clone().unwrap_or_else(crate::detect_locale);
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let overrides = Overrides {
                shards: run_matches.get_one::<usize>("shards").copied(),
                wait: run_matches.get_flag("wait"),
                no_wait: run_matches.get_flag("no-wait"),
            };
            commands::run::execute(
                path_arg(run_matches, "config"),
                overrides,
                run_matches.get_one::<PathBuf>("html").cloned(),
                explicit_lang.is_some(),
            )
            .await?;
        }
        Some(("refresh", refresh_matches)) => {
            commands::refresh::execute(
                path_arg(refresh_matches, "config"),
                refresh_matches.get_one::<PathBuf>("html").cloned(),
                explicit_lang.is_some(),
            )
            .await?;
        }
        Some(("init", init_matches)) => {
            commands::init::execute(
                path_arg(init_matches, "output"),
                init_matches.get_flag("force"),
                init_matches.get_flag("non-interactive"),
            )?;
        }
        _ => {
            // Clap has already printed the help text.
        }
    }
    Ok(())
}

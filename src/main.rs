use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use pagewatch::commands;

fn config_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("FILE")
                .help("Load environment variables from this file instead of ./.env"),
        )
        .arg(
            Arg::new("pages")
                .long("pages")
                .value_name("FILE")
                .help("Pages config (JSON map of path to class), overrides PAGES_CONFIG"),
        )
        .arg(
            Arg::new("messages")
                .long("messages")
                .value_name("FILE")
                .help("Message templates (JSON), overrides MESSAGES_CONFIG"),
        )
}

fn cli() -> Command {
    let run = config_args(
        Command::new("run")
            .about("Watch the configured pages and report changes (default)")
            .arg(
                Arg::new("console")
                    .long("console")
                    .help("Print notifications to stdout and read commands from stdin instead of Telegram")
                    .action(ArgAction::SetTrue),
            ),
    );

    let check = config_args(
        Command::new("check").about("Probe every configured page once and print the results"),
    );

    config_args(
        Command::new("pagewatch")
            .about("Watches web pages and reports sustained status and block-count changes")
            .disable_version_flag(true)
            .arg(
                Arg::new("version")
                    .short('v')
                    .short_alias('V')
                    .long("version")
                    .help("Print version information")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("console")
                    .long("console")
                    .help("Same as 'run --console'")
                    .action(ArgAction::SetTrue),
            ),
    )
    .subcommand(run)
    .subcommand(check)
    .subcommand(Command::new("version").about("Shows version information"))
}

fn main() -> Result<()> {
    pagewatch::init_logging();

    let matches = cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches),
        Some(("check", sub_matches)) => commands::check(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => commands::run(&matches),
    }
}

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "restock",
    about = "Restock operator CLI",
    long_about = "Analyze sales records, request stock suggestions, and inspect reasoning engine configuration.",
    after_help = "Examples:\n  restock analyze --input sales.json\n  restock suggest --input request.json\n  restock doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a restock.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compute sales statistics for a JSON file of sales records")]
    Analyze {
        #[arg(long, help = "JSON file with `salesData` or a bare record array")]
        input: PathBuf,
    },
    #[command(about = "Run the full suggestion pipeline against the configured reasoning engine")]
    Suggest {
        #[arg(long, help = "JSON file holding a stock suggestion request")]
        input: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and reasoning engine readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Command::Analyze { input } => commands::analyze::run(&input),
        Command::Suggest { input } => commands::suggest::run(&input, config_path),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config_path) }
        }
        Command::Doctor { json } => commands::doctor::run(json, config_path),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

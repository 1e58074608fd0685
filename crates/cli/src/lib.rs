pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "autoventa",
    about = "Autoventa operator CLI",
    long_about = "Inspect configuration, check runtime readiness, and try the guardrails against sample text.",
    after_help = "Examples:\n  autoventa doctor --json\n  autoventa config\n  autoventa moderate \"¿tienes novia?\"\n  autoventa scan \"Te garantizo un descuento del 50%\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, guardrail tables, and generation backend readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Classify a user message with the moderation engine")]
    Moderate {
        #[arg(help = "Message text to classify")]
        text: String,
    },
    #[command(about = "Scan a candidate reply for PII, commitments, and quality")]
    Scan {
        #[arg(help = "Reply text to scan")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Moderate { text } => commands::moderate::run(&text),
        Command::Scan { text } => commands::scan::run(&text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use pointsrus_core::LEADERBOARD_SIZE;

#[derive(Debug, Parser)]
#[command(
    name = "pointsrus",
    about = "Pointsrus operator CLI",
    long_about = "Apply score store migrations, inspect effective configuration, and print the leaderboard.",
    after_help = "Examples:\n  pointsrus migrate\n  pointsrus config\n  pointsrus leaderboard --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Print the formatted leaderboard table from the configured score store")]
    Leaderboard {
        #[arg(long, default_value_t = LEADERBOARD_SIZE, help = "Number of rows to print")]
        limit: u32,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Leaderboard { limit } => commands::leaderboard::run(limit),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

//! taskspec CLI
//!
//! Validates task documents from the command line.
//!
//! Usage:
//!   taskspec validate task.yaml                  # Human-readable report
//!   taskspec validate tasks/*.yaml --format json # JSON array of per-file reports
//!   taskspec validate task.yaml --config cfg.yaml
//!   taskspec config                              # Show the effective config
//!
//! Exits with status 1 when any file is invalid or cannot be loaded.

use crate::cli::{Cli, Commands};
use crate::command::{handle_config_command, handle_validate_command};
use colored::Colorize;

mod cli;
mod command;
mod document;
mod utils;

fn main() {
    use clap::Parser;
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate(args) => handle_validate_command(args),
        Commands::Config(args) => handle_config_command(args).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

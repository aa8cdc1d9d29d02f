//! Loadout CLI Binary
//!
//! Command-line interface for the Loadout component installer.

use clap::Parser;
use loadout::logging::LoggingConfig;
use loadout::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_flags(
        cli.verbose,
        cli.log_level.clone(),
        cli.log_format.clone(),
        cli.log_output.clone(),
        cli.log_file.clone(),
    );

    let context = match CliContext::new(cli.project.clone(), &logging) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing project context: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

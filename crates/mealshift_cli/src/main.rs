//! mealshift - staffing CLI for volunteer meal events.
//!
//! Drives the core engine against a local SQLite file and prints JSON.

use anyhow::Result;
use clap::Parser;

mod commands;
mod output;

use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = cli.run() {
        output::print_error(&err);
        std::process::exit(1);
    }

    Ok(())
}

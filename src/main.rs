//! Eurolita - name plausibility checker CLI
//!
//! Scores how typical a first/last name pair is for a claimed European
//! country, from locally aggregated census exports.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // Logging is initialized inside `cli::run` once config (and its log level) is resolved
    let cli = cli::Cli::parse();
    cli::run(cli)
}

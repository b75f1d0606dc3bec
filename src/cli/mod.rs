//! CLI command definitions and handlers

mod build;
mod check;
mod clean;
mod init;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};
use eurolita::config::EngineConfig;
use std::path::PathBuf;

/// Eurolita - how plausible is this name for this country?
///
/// 100% LOCAL - scores run against census exports on your machine.
#[derive(Parser, Debug)]
#[command(name = "eurolita")]
#[command(
    version,
    about = "Score how plausible a first/last name pair is for a European country",
    long_about = "Eurolita aggregates European name-frequency census exports into compact \
per-country tables, then scores a (first name, last name, country) triple with a \
smoothed likelihood model against the EU-wide baseline.\n\n\
The first run builds an on-disk aggregate cache; later runs load it directly.",
    after_help = "\
Examples:
  eurolita check Anna Müller Germany           Score a name pair
  eurolita check Anna Müller DE --format json  JSON output for scripting
  eurolita build --force                       Rebuild the aggregate cache
  eurolita status                              Show data and cache locations
  eurolita clean --dry-run                     Show what clean would delete"
)]
pub struct Cli {
    /// Config file (default: ~/.config/eurolita/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the raw census exports
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Aggregate cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a first/last name pair against a claimed country
    #[command(after_help = "\
Exit codes:
  0  scored (whatever the plausibility)
  1  startup failed (bad data or config)
  2  the evaluation itself failed")]
    Check {
        /// Given name
        first: String,

        /// Family name
        last: String,

        /// Claimed country: display name ("Germany") or code ("DE")
        country: String,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Load the aggregate cache, building it if missing or stale
    Build {
        /// Rebuild even if the cache is valid
        #[arg(long)]
        force: bool,
    },

    /// Show data/cache locations and cache validity
    Status,

    /// Delete the aggregate cache
    Clean {
        /// Only show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Write an example config file (to --config, or the user config path)
    Init,
}

impl Cli {
    /// Config from files and environment, with CLI flags on top.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load(self.config.as_deref())?;
        if let Some(dir) = &self.data_dir {
            config.data.dir = Some(dir.clone());
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = Some(level.clone());
        }
        Ok(config)
    }
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    // Init must work even when the config it would create does not exist yet.
    if matches!(cli.command, Commands::Init) {
        return init::run(cli.config.as_deref());
    }

    let config = cli.engine_config()?;
    eurolita::logging::init(&config.log_settings())?;

    match cli.command {
        Commands::Check {
            first,
            last,
            country,
            format,
        } => check::run(&config, &first, &last, &country, &format),
        Commands::Build { force } => build::run(&config, force),
        Commands::Status => status::run(&config),
        Commands::Clean { dry_run } => clean::run(&config, dry_run),
        Commands::Init => Ok(()),
    }
}

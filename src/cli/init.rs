//! Init command - write an example config file

use anyhow::Result;
use console::style;
use eurolita::config::EngineConfig;
use std::path::Path;

/// Run the init command
pub fn run(target: Option<&Path>) -> Result<()> {
    let config_path = match target {
        Some(path) => path.to_path_buf(),
        None => EngineConfig::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };

    if EngineConfig::write_example(&config_path)? {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }
    println!(
        "\nPoint {} at your census exports, then run {}",
        style("[data] dir").bold(),
        style("eurolita build").cyan()
    );
    Ok(())
}

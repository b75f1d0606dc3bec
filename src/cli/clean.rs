//! Clean command - remove the aggregate cache

use anyhow::{Context, Result};
use eurolita::cache::{paths, AggregateCache};
use eurolita::config::EngineConfig;

pub fn run(config: &EngineConfig, dry_run: bool) -> Result<()> {
    let cache = AggregateCache::new(config.cache_dir());

    let found: Vec<_> = paths::removable_paths(cache.dir())
        .into_iter()
        .filter(|p| p.exists())
        .collect();

    if found.is_empty() {
        println!("No aggregate cache found at {}.", cache.dir().display());
        return Ok(());
    }

    println!(
        "Found {} cache file{}:",
        found.len(),
        if found.len() == 1 { "" } else { "s" }
    );
    for path in &found {
        println!("  {}", path.display());
    }

    if dry_run {
        println!("\nDry run - nothing removed. Run without --dry-run to delete.");
        return Ok(());
    }

    let removed = cache
        .clear()
        .with_context(|| format!("Failed to clean {}", cache.dir().display()))?;
    println!(
        "\nRemoved {} file{}.",
        removed,
        if removed == 1 { "" } else { "s" }
    );
    Ok(())
}

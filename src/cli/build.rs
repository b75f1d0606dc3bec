//! Build command - load or (re)build the aggregate cache

use anyhow::{Context, Result};
use console::style;
use eurolita::cache::{AggregateCache, CacheOutcome};
use eurolita::config::EngineConfig;
use std::time::Instant;

pub fn run(config: &EngineConfig, force: bool) -> Result<()> {
    let sources = config.sources();
    let cache = AggregateCache::new(config.cache_dir());
    let start = Instant::now();

    let (tables, outcome) = if force {
        let tables = cache
            .rebuild(&sources)
            .context("Failed to build aggregate cache")?;
        (tables, CacheOutcome::Rebuilt)
    } else {
        cache
            .load_or_rebuild(&sources)
            .context("Failed to build aggregate cache")?
    };

    let verb = match outcome {
        CacheOutcome::Loaded => "Loaded",
        CacheOutcome::Rebuilt => "Built",
    };
    println!(
        "{} {} aggregate cache at {} in {:.1}s",
        style("✓").green(),
        verb,
        style(cache.dir().display()).cyan(),
        start.elapsed().as_secs_f64()
    );
    println!(
        "  {} given-name rows, {} family-name rows, {} countries",
        style(tables.given.len()).cyan(),
        style(tables.family.len()).cyan(),
        style(tables.totals.len()).cyan()
    );
    println!(
        "  vocabulary: {} given, {} family",
        tables.global.given_vocab, tables.global.family_vocab
    );
    Ok(())
}

//! Status command - show data and cache state

use anyhow::Result;
use console::style;
use eurolita::cache::{AggregateCache, CacheStatus};
use eurolita::config::EngineConfig;

/// Run the status command
pub fn run(config: &EngineConfig) -> Result<()> {
    let sources = config.sources();
    let cache = AggregateCache::new(config.cache_dir());

    println!("\nEurolita Status\n");
    println!("  Data: {}", style(config.data_dir().display()).cyan());
    println!("  Cache: {}", style(cache.dir().display()).dim());
    println!("  Lookup: {:?}", config.lookup_strategy());
    println!();

    for path in sources
        .name_sources()
        .chain(std::iter::once(sources.country_codes.as_path()))
    {
        if path.exists() {
            println!("  {} {}", style("[OK]").green(), path.display());
        } else {
            println!("  {} {} (missing)", style("[!!]").red(), path.display());
        }
    }
    println!();

    match cache.status() {
        CacheStatus::Valid(sidecar) => {
            println!(
                "  {} Aggregate cache valid (schema v{}, built {})",
                style("[OK]").green(),
                sidecar.schema_version,
                sidecar.generated_at
            );
            println!(
                "      {} given names ({} distinct), {} family names ({} distinct)",
                style(sidecar.global.given_total).cyan(),
                sidecar.global.given_vocab,
                style(sidecar.global.family_total).cyan(),
                sidecar.global.family_vocab
            );
        }
        CacheStatus::Invalid(reason) => {
            println!(
                "  {} No usable cache ({}). Run {}",
                style("[--]").dim(),
                reason,
                style("eurolita build").cyan()
            );
        }
    }
    println!();
    Ok(())
}

//! Check command - score one name pair

use anyhow::{Context, Result};
use console::style;
use eurolita::config::EngineConfig;
use eurolita::{EngineError, PlausibilityEngine, PlausibilityLabel, PlausibilityResult};

/// Exit code when the evaluation itself fails
const EXIT_ENGINE_FAILURE: i32 = 2;

pub fn run(config: &EngineConfig, first: &str, last: &str, country: &str, format: &str) -> Result<()> {
    let engine =
        PlausibilityEngine::from_config(config).context("Failed to load reference data")?;

    let result = match engine.evaluate(first, last, country) {
        Ok(result) => result,
        Err(e) => std::process::exit(degrade(first, last, country, &e)),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text(first, last, &result),
    }
    Ok(())
}

/// Log the failure, print the degraded response and pick the exit code.
fn degrade(first: &str, last: &str, country: &str, err: &EngineError) -> i32 {
    tracing::error!("Evaluation failed for {:?} {:?} / {:?}: {}", first, last, country, err);
    eprintln!(
        "{} Could not evaluate this name right now. Please try again later.",
        style("[!!]").red()
    );
    EXIT_ENGINE_FAILURE
}

fn print_text(first: &str, last: &str, result: &PlausibilityResult) {
    println!(
        "\n  {} {} claimed for {}\n",
        style(first).bold(),
        style(last).bold(),
        style(&result.country).cyan()
    );

    let label = match result.plausibility_label {
        PlausibilityLabel::VeryTypical | PlausibilityLabel::Typical => {
            style(result.plausibility_label.as_str()).green()
        }
        PlausibilityLabel::Neutral => style(result.plausibility_label.as_str()).yellow(),
        PlausibilityLabel::Unusual | PlausibilityLabel::VeryUnusual => {
            style(result.plausibility_label.as_str()).red()
        }
    };
    println!(
        "  Plausibility: {} (ratio {})",
        label.bold(),
        result.plausibility_ratio
    );
    println!(
        "  Claimed country: {}% of posterior, rank {}",
        result.posterior_share_claimed_pct, result.claimed_rank
    );
    println!("  Most likely: {}", style(&result.top_country).cyan());

    if result.ranked_countries.is_empty() {
        println!("\n  {}", style("No countries in the reference data.").dim());
        return;
    }

    println!(
        "\n  {:>2}  {:<24} {:>8} {:>10} {:>10}",
        "#", "Country", "Share", "First", "Last"
    );
    for row in &result.ranked_countries {
        let marker = if row.is_claimed { "*" } else { " " };
        let line = format!(
            "{:>2}{} {:<24} {:>7}% {:>10} {:>10}",
            row.rank,
            marker,
            row.country,
            row.posterior_share_pct,
            row.first_count,
            row.last_count
        );
        if row.is_claimed {
            println!("  {}", style(line).bold());
        } else {
            println!("  {}", line);
        }
    }
    println!();
}

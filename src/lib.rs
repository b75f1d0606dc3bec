//! Eurolita - name plausibility scoring against European census data
//!
//! Raw per-country name-frequency exports are aggregated once into compact
//! columnar tables ([`reference`]), persisted in an on-disk cache
//! ([`cache`]), queried per name through a bounded memo ([`lookup`]), and
//! scored by [`PlausibilityEngine::evaluate`].
//!
//! ```no_run
//! use eurolita::config::EngineConfig;
//! use eurolita::PlausibilityEngine;
//!
//! let config = EngineConfig::load(None)?;
//! let engine = PlausibilityEngine::from_config(&config)?;
//! let result = engine.evaluate("Anna", "Müller", "Germany")?;
//! println!("{} ({})", result.plausibility_label, result.plausibility_ratio);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod reference;
pub mod scoring;

pub use error::{CacheError, DataSchemaError, EngineError, StartupError};
pub use scoring::{
    ClaimedRank, CountryRanking, PlausibilityEngine, PlausibilityLabel, PlausibilityResult,
    RankedCountry,
};

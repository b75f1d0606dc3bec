//! Plausibility scoring: the engine, its output record, and the label bands

mod engine;
mod label;
mod result;

pub use engine::{
    CountryRanking, CountryScore, PlausibilityEngine, RANKING_SIZE, SMOOTHING_ALPHA,
};
pub use label::PlausibilityLabel;
pub use result::{ClaimedRank, PlausibilityResult, RankedCountry};

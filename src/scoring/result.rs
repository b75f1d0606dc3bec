//! The engine's output record

use super::label::PlausibilityLabel;
use serde::{Serialize, Serializer};
use std::fmt;

/// Claimed country's position in the full ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimedRank {
    /// 1-based position
    Position(usize),
    /// The claimed country has no totals entry
    Unknown,
}

impl ClaimedRank {
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Position(p) => Some(*p),
            Self::Unknown => None,
        }
    }
}

impl Serialize for ClaimedRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Position(p) => serializer.serialize_u64(*p as u64),
            Self::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl fmt::Display for ClaimedRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(p) => write!(f, "{}", p),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// One row of the ranking view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCountry {
    pub rank: usize,
    /// Display name
    pub country: String,
    pub posterior_share_pct: f64,
    pub first_count: u64,
    pub last_count: u64,
    pub is_claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlausibilityResult {
    /// Claimed country exactly as given
    pub country: String,
    pub plausibility_ratio: f64,
    pub plausibility_label: PlausibilityLabel,
    pub posterior_share_claimed_pct: f64,
    pub claimed_rank: ClaimedRank,
    pub top_country: String,
    /// At most eight rows, best first
    pub ranked_countries: Vec<RankedCountry>,
}

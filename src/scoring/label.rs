//! Ratio -> human-readable plausibility band

use serde::{Deserialize, Serialize};
use std::fmt;

/// Five ordered plausibility bands.
///
/// Bands are inclusive-lower, exclusive-upper; the top band is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlausibilityLabel {
    #[serde(rename = "Very unusual")]
    VeryUnusual,
    #[serde(rename = "Unusual")]
    Unusual,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Typical")]
    Typical,
    #[serde(rename = "Very typical")]
    VeryTypical,
}

impl PlausibilityLabel {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.3 {
            Self::VeryUnusual
        } else if ratio < 0.7 {
            Self::Unusual
        } else if ratio < 1.5 {
            Self::Neutral
        } else if ratio < 3.0 {
            Self::Typical
        } else {
            Self::VeryTypical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryUnusual => "Very unusual",
            Self::Unusual => "Unusual",
            Self::Neutral => "Neutral",
            Self::Typical => "Typical",
            Self::VeryTypical => "Very typical",
        }
    }

    pub fn all() -> [Self; 5] {
        [
            Self::VeryUnusual,
            Self::Unusual,
            Self::Neutral,
            Self::Typical,
            Self::VeryTypical,
        ]
    }
}

impl fmt::Display for PlausibilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

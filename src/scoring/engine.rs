//! Smoothed-likelihood plausibility scoring
//!
//! For every country in the totals table:
//!
//! ```text
//! p_first(c) = (first_count(c) + a) / (given_total(c)  + a * given_vocab)
//! p_last(c)  = (last_count(c)  + a) / (family_total(c) + a * family_vocab)
//! joint(c)   = p_first(c) * p_last(c)     (0 when both raw counts are 0)
//! ```
//!
//! Joints are normalized into a posterior over countries. The claimed
//! country's joint is compared against the same quantity computed from the
//! dataset-wide totals, which gives the plausibility ratio.

use super::label::PlausibilityLabel;
use super::result::{ClaimedRank, PlausibilityResult, RankedCountry};
use crate::cache::AggregateCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, StartupError};
use crate::lookup::{CountryCount, LookupMemo, LookupStrategy, NameLookup};
use crate::reference::{normalize_name, CountryCodeMap, NameKind, ReferenceTables};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Additive smoothing strength
pub const SMOOTHING_ALPHA: f64 = 0.5;

/// Rows in the ranking view
pub const RANKING_SIZE: usize = 8;

/// Score of one country for one name pair
#[derive(Debug, Clone, PartialEq)]
pub struct CountryScore {
    pub code: String,
    pub first_count: u64,
    pub last_count: u64,
    pub joint: f64,
    /// Share of the summed joints, in [0, 1]
    pub posterior: f64,
}

/// Every country in the totals table, best first
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRanking {
    pub scores: Vec<CountryScore>,
    /// Joint likelihood under the dataset-wide totals
    pub baseline: f64,
}

impl CountryRanking {
    /// 0-based position of `code`, if it is ranked at all.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.scores.iter().position(|s| s.code == code)
    }
}

/// The single query entry point over loaded reference data
#[derive(Debug, Clone)]
pub struct PlausibilityEngine {
    tables: Arc<ReferenceTables>,
    lookup: NameLookup,
    countries: CountryCodeMap,
}

impl PlausibilityEngine {
    pub fn new(tables: Arc<ReferenceTables>, lookup: NameLookup, countries: CountryCodeMap) -> Self {
        Self {
            tables,
            lookup,
            countries,
        }
    }

    /// Engine with the default lookup strategy and memo bounds.
    pub fn with_tables(tables: ReferenceTables, countries: CountryCodeMap) -> Self {
        let tables = Arc::new(tables);
        let lookup = NameLookup::new(
            Arc::clone(&tables),
            LookupStrategy::default(),
            LookupMemo::default(),
        );
        Self::new(tables, lookup, countries)
    }

    /// Load the country map and the aggregate (from cache or raw data).
    pub fn from_config(config: &EngineConfig) -> Result<Self, StartupError> {
        let sources = config.sources();
        let countries = CountryCodeMap::load(&sources.country_codes)?;
        let cache = AggregateCache::new(config.cache_dir());
        let (tables, outcome) = cache.load_or_rebuild(&sources)?;
        info!(
            "Engine ready: {} countries ranked, {} mapped ({:?} aggregate)",
            tables.totals.len(),
            countries.len(),
            outcome
        );

        let tables = Arc::new(tables);
        let lookup = NameLookup::new(
            Arc::clone(&tables),
            config.lookup_strategy(),
            LookupMemo::new(config.name_capacity(), config.global_capacity()),
        );
        Ok(Self::new(tables, lookup, countries))
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn countries(&self) -> &CountryCodeMap {
        &self.countries
    }

    pub fn lookup(&self) -> &NameLookup {
        &self.lookup
    }

    /// Score a name pair against a claimed country.
    ///
    /// Never fails because of the input values. An `Err` means the evaluation
    /// itself broke, and the caller decides how to degrade.
    pub fn evaluate(
        &self,
        first_name: &str,
        last_name: &str,
        claimed_country: &str,
    ) -> EngineResult<PlausibilityResult> {
        contain(|| self.evaluate_inner(first_name, last_name, claimed_country))
    }

    /// Full ranking of every country for a name pair (not truncated).
    pub fn ranking(&self, first_name: &str, last_name: &str) -> EngineResult<CountryRanking> {
        self.rank(&normalize_name(first_name), &normalize_name(last_name))
    }

    fn evaluate_inner(
        &self,
        first_name: &str,
        last_name: &str,
        claimed_country: &str,
    ) -> EngineResult<PlausibilityResult> {
        let code = self.countries.code_for(claimed_country);
        let first = normalize_name(first_name);
        let last = normalize_name(last_name);

        let ranking = self.rank(&first, &last)?;

        let position = ranking.position(&code);
        let (claimed_joint, claimed_posterior) = position
            .map(|i| (ranking.scores[i].joint, ranking.scores[i].posterior))
            .unwrap_or((0.0, 0.0));

        let ratio = if ranking.baseline > 0.0 {
            claimed_joint / ranking.baseline
        } else {
            0.0
        };
        if !ratio.is_finite() {
            return Err(EngineError::NonFinite {
                quantity: "plausibility ratio",
            });
        }
        // The label below is taken from this rounded value, so it always
        // agrees with the reported ratio (even right at a band edge).
        let ratio = round_to(ratio, 3);

        let top_country = match ranking.scores.first() {
            Some(top) => self.countries.display_name(&top.code).to_string(),
            None => claimed_country.to_string(),
        };

        let ranked_countries = ranking
            .scores
            .iter()
            .take(RANKING_SIZE)
            .enumerate()
            .map(|(i, score)| RankedCountry {
                rank: i + 1,
                country: self.countries.display_name(&score.code).to_string(),
                posterior_share_pct: round_to(score.posterior * 100.0, 2),
                first_count: score.first_count,
                last_count: score.last_count,
                is_claimed: score.code == code,
            })
            .collect();

        let result = PlausibilityResult {
            country: claimed_country.to_string(),
            plausibility_ratio: ratio,
            plausibility_label: PlausibilityLabel::from_ratio(ratio),
            posterior_share_claimed_pct: round_to(claimed_posterior * 100.0, 2),
            claimed_rank: position
                .map(|i| ClaimedRank::Position(i + 1))
                .unwrap_or(ClaimedRank::Unknown),
            top_country,
            ranked_countries,
        };

        debug!(
            "evaluate({:?}, {:?}, {:?} -> {:?}): ratio={} label={} rank={}",
            first,
            last,
            claimed_country,
            code,
            result.plausibility_ratio,
            result.plausibility_label,
            result.claimed_rank
        );
        Ok(result)
    }

    /// Score every country for already-normalized names.
    fn rank(&self, first: &str, last: &str) -> EngineResult<CountryRanking> {
        let global = &self.tables.global;
        let first_counts = self.lookup.per_country_counts(first, NameKind::Given);
        let last_counts = self.lookup.per_country_counts(last, NameKind::Family);

        let mut scores = Vec::with_capacity(self.tables.totals.len());
        for totals in &self.tables.totals {
            let first_count = count_in(&first_counts, &totals.country);
            let last_count = count_in(&last_counts, &totals.country);

            // No evidence at all must not be lifted by smoothing alone.
            let joint = if first_count == 0 && last_count == 0 {
                0.0
            } else {
                smoothed(first_count, totals.given_total, global.given_vocab)
                    * smoothed(last_count, totals.family_total, global.family_vocab)
            };
            if !joint.is_finite() {
                return Err(EngineError::NonFinite {
                    quantity: "joint likelihood",
                });
            }

            scores.push(CountryScore {
                code: totals.country.clone(),
                first_count,
                last_count,
                joint,
                posterior: 0.0,
            });
        }

        let sum: f64 = scores.iter().map(|s| s.joint).sum();
        let denominator = if sum > 0.0 { sum } else { 1.0 };
        for score in &mut scores {
            score.posterior = score.joint / denominator;
        }

        // Stable: equal joints keep totals-table order.
        scores.sort_by(|a, b| b.joint.total_cmp(&a.joint));

        let baseline = smoothed(
            self.lookup.global_count(first, NameKind::Given),
            global.given_total,
            global.given_vocab,
        ) * smoothed(
            self.lookup.global_count(last, NameKind::Family),
            global.family_total,
            global.family_vocab,
        );
        if !baseline.is_finite() {
            return Err(EngineError::NonFinite {
                quantity: "baseline likelihood",
            });
        }

        Ok(CountryRanking { scores, baseline })
    }
}

/// Run one evaluation, turning a panic inside it into `EngineError::Panicked`.
fn contain<T>(f: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Evaluation panicked: {}", panic_msg);
            Err(EngineError::Panicked(panic_msg))
        }
    }
}

/// Additively smoothed conditional likelihood. Zero for an empty table.
fn smoothed(count: u64, total: u64, vocab: u64) -> f64 {
    let denominator = total as f64 + SMOOTHING_ALPHA * vocab as f64;
    if denominator > 0.0 {
        (count as f64 + SMOOTHING_ALPHA) / denominator
    } else {
        0.0
    }
}

fn count_in(counts: &[CountryCount], country: &str) -> u64 {
    counts
        .binary_search_by(|c| c.country.as_str().cmp(country))
        .map(|i| counts[i].count)
        .unwrap_or(0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::NameTable;
    use proptest::prelude::*;
    use rustc_hash::FxHashMap;

    fn table(rows: &[(&str, &str, u64)]) -> NameTable {
        let counts: FxHashMap<(String, String), u64> = rows
            .iter()
            .map(|(c, n, v)| ((c.to_string(), n.to_string()), *v))
            .collect();
        NameTable::from_counts(counts)
    }

    /// Two countries, two names per table: small enough to check by hand.
    fn engine() -> PlausibilityEngine {
        let tables = ReferenceTables::from_tables(
            table(&[("A", "x", 3), ("B", "x", 1), ("B", "y", 4)]),
            table(&[("A", "p", 2), ("B", "q", 2)]),
        );
        let countries = CountryCodeMap::from_pairs([("Alpha", "A"), ("Beta", "B")]);
        PlausibilityEngine::with_tables(tables, countries)
    }

    #[test]
    fn test_smoothed() {
        assert_eq!(smoothed(3, 3, 2), 0.875);
        assert_eq!(smoothed(0, 0, 0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.916_666, 3), 2.917);
        assert_eq!(round_to(94.594_59, 2), 94.59);
    }

    #[test]
    fn test_label_follows_rounded_ratio_at_band_edge() {
        let reported = round_to(0.299_96, 3);
        assert_eq!(reported, 0.3);
        assert_eq!(
            PlausibilityLabel::from_ratio(reported),
            PlausibilityLabel::Unusual
        );
    }

    #[test]
    fn test_evaluate_hand_computed() {
        // A: 3.5/4 * 2.5/3 = 0.729167   B: 1.5/6 * 0.5/3 = 0.041667
        // baseline: 4.5/9 * 2.5/5 = 0.25
        let result = engine().evaluate("x", "p", "Alpha").unwrap();
        assert_eq!(result.plausibility_ratio, 2.917);
        assert_eq!(result.plausibility_label, PlausibilityLabel::Typical);
        assert_eq!(result.posterior_share_claimed_pct, 94.59);
        assert_eq!(result.claimed_rank, ClaimedRank::Position(1));
        assert_eq!(result.top_country, "Alpha");
        assert_eq!(result.country, "Alpha");

        let rows = &result.ranked_countries;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "Alpha");
        assert_eq!((rows[0].first_count, rows[0].last_count), (3, 2));
        assert!(rows[0].is_claimed);
        assert_eq!(rows[1].country, "Beta");
        assert_eq!(rows[1].posterior_share_pct, 5.41);
        assert_eq!((rows[1].first_count, rows[1].last_count), (1, 0));
        assert!(!rows[1].is_claimed);
    }

    #[test]
    fn test_no_evidence_anywhere() {
        let result = engine().evaluate("z", "r", "Beta").unwrap();
        assert_eq!(result.plausibility_ratio, 0.0);
        assert_eq!(result.plausibility_label, PlausibilityLabel::VeryUnusual);
        assert_eq!(result.posterior_share_claimed_pct, 0.0);
        // All joints tie at zero; stable order keeps A before B
        assert_eq!(result.claimed_rank, ClaimedRank::Position(2));
        assert_eq!(result.top_country, "Alpha");
    }

    #[test]
    fn test_zero_guard_beats_smoothing() {
        let ranking = engine().ranking("y", "q").unwrap();
        let a = &ranking.scores[ranking.position("A").unwrap()];
        assert_eq!((a.first_count, a.last_count), (0, 0));
        assert_eq!(a.joint, 0.0);
        assert_eq!(ranking.scores[0].code, "B");
    }

    #[test]
    fn test_unknown_country() {
        let result = engine().evaluate("x", "p", "Gamma").unwrap();
        assert_eq!(result.claimed_rank, ClaimedRank::Unknown);
        assert_eq!(result.plausibility_ratio, 0.0);
        assert_eq!(result.posterior_share_claimed_pct, 0.0);
        assert!(result.ranked_countries.iter().all(|r| !r.is_claimed));
        assert_eq!(result.country, "Gamma");
    }

    #[test]
    fn test_code_input_accepted() {
        let by_name = engine().evaluate("x", "p", "Alpha").unwrap();
        let by_code = engine().evaluate("x", "p", "a").unwrap();
        assert_eq!(by_name.plausibility_ratio, by_code.plausibility_ratio);
        assert_eq!(by_code.country, "a");
    }

    #[test]
    fn test_empty_tables() {
        let engine = PlausibilityEngine::with_tables(
            ReferenceTables::default(),
            CountryCodeMap::default(),
        );
        let result = engine.evaluate("anna", "müller", "Germany").unwrap();
        assert_eq!(result.plausibility_ratio, 0.0);
        assert_eq!(result.claimed_rank, ClaimedRank::Unknown);
        assert_eq!(result.top_country, "Germany");
        assert!(result.ranked_countries.is_empty());
    }

    fn twelve_country_engine() -> PlausibilityEngine {
        let codes: Vec<String> = ["A", "B"]
            .iter()
            .flat_map(|p| (0..10).map(move |i| format!("{p}{i}")))
            .take(12)
            .collect();
        // Count of "x" grows with the index, so B1 ranks first and A0 last
        let given: Vec<(&str, &str, u64)> = codes
            .iter()
            .enumerate()
            .flat_map(|(i, c)| [(c.as_str(), "x", i as u64 + 1), (c.as_str(), "y", 20)])
            .collect();
        let family: Vec<(&str, &str, u64)> =
            codes.iter().map(|c| (c.as_str(), "p", 5)).collect();
        PlausibilityEngine::with_tables(
            ReferenceTables::from_tables(table(&given), table(&family)),
            CountryCodeMap::default(),
        )
    }

    #[test]
    fn test_ranking_truncated_to_eight() {
        let engine = twelve_country_engine();

        let result = engine.evaluate("x", "p", "A0").unwrap();
        assert_eq!(result.ranked_countries.len(), RANKING_SIZE);
        let ranks: Vec<usize> = result.ranked_countries.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=8).collect::<Vec<_>>());
        // Lowest count ranks last, outside the view
        assert_eq!(result.claimed_rank, ClaimedRank::Position(12));
        assert!(result.ranked_countries.iter().all(|r| !r.is_claimed));
        assert_eq!(result.top_country, "B1");
    }

    #[test]
    fn test_claimed_row_flagged_inside_view() {
        let engine = twelve_country_engine();

        let result = engine.evaluate("x", "p", "b0").unwrap();
        assert_eq!(result.claimed_rank, ClaimedRank::Position(2));
        let claimed: Vec<&RankedCountry> =
            result.ranked_countries.iter().filter(|r| r.is_claimed).collect();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].rank, 2);
        assert_eq!(claimed[0].country, "B0");
    }

    #[test]
    fn test_contain_passes_results_through() {
        assert_eq!(contain(|| Ok(7)).unwrap(), 7);
        let err = contain::<()>(|| {
            Err(EngineError::NonFinite {
                quantity: "joint likelihood",
            })
        })
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::NonFinite {
                quantity: "joint likelihood"
            }
        ));
    }

    #[test]
    fn test_contain_catches_str_panic() {
        let err = contain::<()>(|| panic!("table column out of range")).unwrap_err();
        match err {
            EngineError::Panicked(msg) => assert_eq!(msg, "table column out of range"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_contain_catches_formatted_panic() {
        let row = 42;
        let err = contain::<()>(|| panic!("bad row {row}")).unwrap_err();
        match err {
            EngineError::Panicked(msg) => assert_eq!(msg, "bad row 42"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_contain_catches_opaque_panic() {
        let err = contain::<()>(|| std::panic::panic_any(17u8)).unwrap_err();
        assert!(matches!(err, EngineError::Panicked(msg) if msg == "Unknown panic"));
    }

    proptest! {
        #[test]
        fn posterior_is_a_distribution(first in "[xyz]{0,2}", last in "[pqr]{0,2}") {
            let ranking = engine().ranking(&first, &last).unwrap();
            let sum: f64 = ranking.scores.iter().map(|s| s.posterior).sum();
            let any_evidence = ranking.scores.iter().any(|s| s.joint > 0.0);
            if any_evidence {
                prop_assert!((sum - 1.0).abs() < 1e-9);
            } else {
                prop_assert_eq!(sum, 0.0);
            }
            for score in &ranking.scores {
                prop_assert!((0.0..=1.0).contains(&score.posterior));
            }
        }

        #[test]
        fn any_input_evaluates(first in ".{0,12}", last in ".{0,12}", country in ".{0,12}") {
            let result = engine().evaluate(&first, &last, &country).unwrap();
            prop_assert!((0.0..=100.0).contains(&result.posterior_share_claimed_pct));
            prop_assert_eq!(
                result.plausibility_label,
                PlausibilityLabel::from_ratio(result.plausibility_ratio)
            );
            prop_assert!(result.ranked_countries.iter().filter(|r| r.is_claimed).count() <= 1);
        }
    }
}

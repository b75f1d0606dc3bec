//! Per-name lookups against the aggregated reference tables
//!
//! Every query goes through a [`LookupMemo`]. A miss computes the answer from
//! the tables and stores it, so a hit always returns what a miss would.

pub mod memo;

pub use memo::{LookupMemo, DEFAULT_GLOBAL_CAPACITY, DEFAULT_NAME_CAPACITY};

use crate::reference::{name_hash, NameKind, NameTable, ReferenceTables};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How candidate rows for a name are located
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStrategy {
    /// Binary search on the hash column, then exact name comparison
    #[default]
    Hashed,
    /// Linear equality filter over the name column
    Scan,
}

impl std::str::FromStr for LookupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" | "hash" => Ok(Self::Hashed),
            "scan" => Ok(Self::Scan),
            other => Err(format!("unknown lookup strategy '{other}' (expected hashed or scan)")),
        }
    }
}

/// Occurrences of one name in one country
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

/// Memoized name lookups over shared, immutable tables
#[derive(Debug, Clone)]
pub struct NameLookup {
    tables: Arc<ReferenceTables>,
    strategy: LookupStrategy,
    memo: LookupMemo,
}

impl NameLookup {
    pub fn new(tables: Arc<ReferenceTables>, strategy: LookupStrategy, memo: LookupMemo) -> Self {
        Self {
            tables,
            strategy,
            memo,
        }
    }

    pub fn strategy(&self) -> LookupStrategy {
        self.strategy
    }

    pub fn memo(&self) -> &LookupMemo {
        &self.memo
    }

    /// Countries where `name` occurs, with their counts, sorted by country code.
    ///
    /// `name` must already be normalized. Rows with a zero count are omitted.
    pub fn per_country_counts(&self, name: &str, kind: NameKind) -> Arc<[CountryCount]> {
        if name.is_empty() {
            return Arc::from(Vec::new());
        }
        self.memo
            .counts(kind)
            .get_with(name.to_string(), || self.compute_counts(name, kind))
    }

    /// Total occurrences of `name` across all countries.
    pub fn global_count(&self, name: &str, kind: NameKind) -> u64 {
        if name.is_empty() {
            return 0;
        }
        self.memo.globals(kind).get_with(name.to_string(), || {
            self.per_country_counts(name, kind)
                .iter()
                .map(|c| c.count)
                .sum()
        })
    }

    fn compute_counts(&self, name: &str, kind: NameKind) -> Arc<[CountryCount]> {
        let table = self.tables.table(kind);
        let rows = match self.strategy {
            LookupStrategy::Hashed => hashed_rows(table, name),
            LookupStrategy::Scan => scan_rows(table, name),
        };

        let mut counts: Vec<CountryCount> = rows
            .into_iter()
            .filter(|&row| table.count_at(row) > 0)
            .map(|row| CountryCount {
                country: table.country_at(row).to_string(),
                count: table.count_at(row),
            })
            .collect();
        counts.sort_by(|a, b| a.country.cmp(&b.country));

        debug!(
            "Lookup miss for {} name '{}': {} countries",
            kind.name(),
            name,
            counts.len()
        );
        counts.into()
    }
}

fn hashed_rows(table: &NameTable, name: &str) -> Vec<usize> {
    // A hash match only nominates a row; the name itself decides.
    table
        .hash_range(name_hash(name))
        .filter(|&row| table.name_at(row) == name)
        .collect()
}

fn scan_rows(table: &NameTable, name: &str) -> Vec<usize> {
    (0..table.len())
        .filter(|&row| table.name_at(row) == name)
        .collect()
}

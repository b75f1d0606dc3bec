//! Aggregated, columnar name-count tables and the totals derived from them

use super::NameKind;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

/// Lookup-acceleration hash of a normalized name.
///
/// Stored alongside every row so equality lookups can binary-search
/// instead of scanning. Never trusted alone: callers re-check the name.
pub fn name_hash(name: &str) -> u64 {
    xxh3_64(name.as_bytes())
}

/// One aggregated name table (given or family names).
///
/// Columnar layout: four parallel columns, sorted by `(hash, name, country)`,
/// unique on `(country, name)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameTable {
    hash: Vec<u64>,
    name: Vec<String>,
    country: Vec<String>,
    count: Vec<u64>,
}

impl NameTable {
    /// Build from aggregated `(country, name) -> count` pairs.
    pub fn from_counts(counts: FxHashMap<(String, String), u64>) -> Self {
        let mut rows: Vec<(u64, String, String, u64)> = counts
            .into_iter()
            .map(|((country, name), count)| (name_hash(&name), name, country, count))
            .collect();
        rows.sort_unstable_by(|a, b| (a.0, &a.1, &a.2).cmp(&(b.0, &b.1, &b.2)));

        let mut table = Self {
            hash: Vec::with_capacity(rows.len()),
            name: Vec::with_capacity(rows.len()),
            country: Vec::with_capacity(rows.len()),
            count: Vec::with_capacity(rows.len()),
        };
        for (hash, name, country, count) in rows {
            table.hash.push(hash);
            table.name.push(name);
            table.country.push(country);
            table.count.push(count);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn name_at(&self, row: usize) -> &str {
        &self.name[row]
    }

    pub fn country_at(&self, row: usize) -> &str {
        &self.country[row]
    }

    pub fn count_at(&self, row: usize) -> u64 {
        self.count[row]
    }

    /// Whether the hash column is present and consistent with the data columns.
    ///
    /// A table decoded from an older cache layout (or a damaged one) fails this.
    pub fn has_hash_column(&self) -> bool {
        let n = self.name.len();
        self.hash.len() == n
            && self.country.len() == n
            && self.count.len() == n
            && self.hash.windows(2).all(|w| w[0] <= w[1])
    }

    /// Row range whose hash equals `hash`. Requires a valid hash column.
    pub fn hash_range(&self, hash: u64) -> std::ops::Range<usize> {
        let start = self.hash.partition_point(|&h| h < hash);
        let end = start + self.hash[start..].partition_point(|&h| h == hash);
        start..end
    }

    /// Sum of all counts. The loader rejects data whose total would not fit.
    pub fn total(&self) -> u64 {
        self.count.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Number of distinct normalized names (not distinct rows).
    pub fn vocab_size(&self) -> u64 {
        // Rows are sorted by (hash, name), so equal names are adjacent.
        let mut distinct = 0u64;
        for row in 0..self.name.len() {
            if row == 0 || self.hash[row] != self.hash[row - 1] || self.name[row] != self.name[row - 1]
            {
                distinct += 1;
            }
        }
        distinct
    }

    /// Per-country count sums.
    pub fn country_totals(&self) -> BTreeMap<&str, u64> {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for (country, count) in self.country.iter().zip(&self.count) {
            let total = totals.entry(country.as_str()).or_insert(0);
            *total = total.saturating_add(*count);
        }
        totals
    }
}

/// Per-country denominators for smoothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryTotal {
    pub country: String,
    pub given_total: u64,
    pub family_total: u64,
}

/// Dataset-wide scalars: totals and vocabulary sizes per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTotals {
    pub given_total: u64,
    pub family_total: u64,
    pub given_vocab: u64,
    pub family_vocab: u64,
}

/// Everything the engine reads at query time. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTables {
    pub given: NameTable,
    pub family: NameTable,
    /// Countries present in both tables, sorted by code
    pub totals: Vec<CountryTotal>,
    pub global: GlobalTotals,
}

impl ReferenceTables {
    /// Derive country totals and global scalars from the two aggregated tables.
    pub fn from_tables(given: NameTable, family: NameTable) -> Self {
        let given_totals = given.country_totals();
        let family_totals = family.country_totals();

        let totals = given_totals
            .iter()
            .filter_map(|(country, &given_total)| {
                family_totals.get(country).map(|&family_total| CountryTotal {
                    country: country.to_string(),
                    given_total,
                    family_total,
                })
            })
            .collect();

        let global = GlobalTotals {
            given_total: given.total(),
            family_total: family.total(),
            given_vocab: given.vocab_size(),
            family_vocab: family.vocab_size(),
        };

        Self {
            given,
            family,
            totals,
            global,
        }
    }

    pub fn table(&self, kind: NameKind) -> &NameTable {
        match kind {
            NameKind::Given => &self.given,
            NameKind::Family => &self.family,
        }
    }
}

//! Bounded, concurrent per-name memo
//!
//! One moka cache per (table, result kind). Entries are keyed by the exact
//! normalized name. Bounded so a stream of unique names cannot grow memory
//! without limit; eviction is moka's TinyLFU/LRU policy.

use super::CountryCount;
use crate::reference::NameKind;
use moka::sync::Cache;
use std::sync::Arc;

/// Default bound for per-country count entries, per table
pub const DEFAULT_NAME_CAPACITY: u64 = 12_000;

/// Default bound for global-count entries, per table
pub const DEFAULT_GLOBAL_CAPACITY: u64 = 25_000;

pub type CountryCounts = Arc<[CountryCount]>;

/// Memoized lookup results, owned by a [`super::NameLookup`]
#[derive(Clone)]
pub struct LookupMemo {
    given_counts: Cache<String, CountryCounts>,
    family_counts: Cache<String, CountryCounts>,
    given_global: Cache<String, u64>,
    family_global: Cache<String, u64>,
}

impl LookupMemo {
    pub fn new(name_capacity: u64, global_capacity: u64) -> Self {
        Self {
            given_counts: Cache::new(name_capacity),
            family_counts: Cache::new(name_capacity),
            given_global: Cache::new(global_capacity),
            family_global: Cache::new(global_capacity),
        }
    }

    pub fn counts(&self, kind: NameKind) -> &Cache<String, CountryCounts> {
        match kind {
            NameKind::Given => &self.given_counts,
            NameKind::Family => &self.family_counts,
        }
    }

    pub fn globals(&self, kind: NameKind) -> &Cache<String, u64> {
        match kind {
            NameKind::Given => &self.given_global,
            NameKind::Family => &self.family_global,
        }
    }

    /// Drop every memoized entry.
    pub fn clear(&self) {
        self.given_counts.invalidate_all();
        self.family_counts.invalidate_all();
        self.given_global.invalidate_all();
        self.family_global.invalidate_all();
    }

    /// Approximate number of live entries across all four caches.
    pub fn entry_count(&self) -> u64 {
        for cache in [&self.given_counts, &self.family_counts] {
            cache.run_pending_tasks();
        }
        for cache in [&self.given_global, &self.family_global] {
            cache.run_pending_tasks();
        }
        self.given_counts.entry_count()
            + self.family_counts.entry_count()
            + self.given_global.entry_count()
            + self.family_global.entry_count()
    }
}

impl Default for LookupMemo {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_CAPACITY, DEFAULT_GLOBAL_CAPACITY)
    }
}

impl std::fmt::Debug for LookupMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupMemo")
            .field("given_counts", &self.given_counts.entry_count())
            .field("family_counts", &self.family_counts.entry_count())
            .field("given_global", &self.given_global.entry_count())
            .field("family_global", &self.family_global.entry_count())
            .finish()
    }
}

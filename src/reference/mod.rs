//! Reference name-frequency data
//!
//! Raw census exports (one given-name source, one or more family-name
//! sources, and a country name/code table) are streamed through the
//! [`loader`], aggregated per `(country, name)`, and kept as compact
//! columnar [`NameTable`]s for the rest of the process lifetime.

mod countries;
mod loader;
mod tables;

pub use countries::CountryCodeMap;
pub use loader::{load_reference_tables, DataSources, COUNT_COLUMNS};
pub use tables::{name_hash, CountryTotal, GlobalTotals, NameTable, ReferenceTables};

use serde::{Deserialize, Serialize};

/// Which of the two independent name tables a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    /// Given names (forenames)
    Given,
    /// Family names (surnames)
    Family,
}

impl NameKind {
    pub fn name(&self) -> &'static str {
        match self {
            NameKind::Given => "given",
            NameKind::Family => "family",
        }
    }
}

/// Normalize a name the same way on ingest and on query: trim, then lowercase.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_trims_and_lowercases() {
        assert_eq!(normalize_name("  ANNA "), "anna");
        assert_eq!(normalize_name("MÜLLER"), "müller");
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("\t"), "");
    }
}

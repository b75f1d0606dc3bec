//! Country name <-> code mapping

use crate::error::{DataResult, DataSchemaError};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const NAME_COLUMN: &str = "country_name";
const CODE_COLUMN: &str = "country_code";

/// Bidirectional mapping between display names and short country codes.
///
/// Built once from the reference CSV and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CountryCodeMap {
    name_to_code: HashMap<String, String>,
    code_to_name: HashMap<String, String>,
}

impl CountryCodeMap {
    /// Build from `(display_name, code)` pairs. Later pairs win on duplicates.
    pub fn from_pairs<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let mut map = Self::default();
        for (name, code) in pairs {
            let (name, code) = (name.into(), code.into());
            map.code_to_name.insert(code.clone(), name.clone());
            map.name_to_code.insert(name, code);
        }
        map
    }

    /// Load the `country_name,country_code` reference table.
    pub fn load(path: &Path) -> DataResult<Self> {
        let file = std::fs::File::open(path).map_err(|source| DataSchemaError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let csv_err = |source: csv::Error| DataSchemaError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let headers = reader.headers().map_err(csv_err)?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| DataSchemaError::MissingColumn {
                    path: path.to_path_buf(),
                    column: wanted.to_string(),
                })
        };
        let name_idx = column(NAME_COLUMN)?;
        let code_idx = column(CODE_COLUMN)?;

        let mut pairs = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let (Some(name), Some(code)) = (record.get(name_idx), record.get(code_idx)) else {
                continue;
            };
            if name.is_empty() || code.is_empty() {
                continue;
            }
            pairs.push((name.to_string(), code.to_string()));
        }

        if pairs.is_empty() {
            return Err(DataSchemaError::EmptyCountryMap {
                path: path.to_path_buf(),
            });
        }

        debug!("Loaded {} country mappings from {}", pairs.len(), path.display());
        Ok(Self::from_pairs(pairs))
    }

    /// Turn user input into a country code.
    ///
    /// An exact display-name match wins. Anything else is assumed to already
    /// be a code: uppercased and cut to two characters. That fallback is not
    /// validated, so an unknown name can land on an unrelated real code
    /// ("Germ" becomes "GE").
    pub fn code_for(&self, claimed: &str) -> String {
        let claimed = claimed.trim();
        if let Some(code) = self.name_to_code.get(claimed) {
            return code.clone();
        }
        claimed.to_uppercase().chars().take(2).collect()
    }

    /// Display name for a code, or the code itself when unmapped.
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.code_to_name.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.name_to_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_code.is_empty()
    }
}

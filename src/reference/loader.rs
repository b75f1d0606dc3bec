//! Streaming aggregation of raw name-count exports
//!
//! Each source is read record-by-record with a reused `StringRecord`; only the
//! distinct `(country, name)` pairs are kept in memory. Family-name exports
//! may be split over several files, which are aggregated in parallel and then
//! merged by summation.

use super::tables::{NameTable, ReferenceTables};
use super::{normalize_name, NameKind};
use crate::error::{DataResult, DataSchemaError};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Accepted names for the occurrence-count column, in order of preference
pub const COUNT_COLUMNS: [&str; 2] = ["count", "frequency"];

const COUNTRY_COLUMN: &str = "country";

/// Log aggregation progress every this many rows
const PROGRESS_EVERY: u64 = 250_000;

type NameCounts = FxHashMap<(String, String), u64>;

/// Physical locations of the raw reference inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub forenames: PathBuf,
    /// Family-name exports, concatenated before aggregation
    pub surnames: Vec<PathBuf>,
    pub country_codes: PathBuf,
}

impl DataSources {
    /// Every raw input that feeds the aggregate (the country map is loaded separately).
    pub fn name_sources(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.forenames.as_path()).chain(self.surnames.iter().map(PathBuf::as_path))
    }
}

/// Aggregate all raw sources into reference tables.
///
/// This is the only heavy step in the system: a full scan of every input.
pub fn load_reference_tables(sources: &DataSources) -> DataResult<ReferenceTables> {
    let start = Instant::now();

    let (given, family) = rayon::join(
        || aggregate_source(&sources.forenames, NameKind::Given),
        || {
            sources
                .surnames
                .par_iter()
                .map(|path| aggregate_source(path, NameKind::Family))
                .collect::<DataResult<Vec<_>>>()
                .and_then(merge_counts)
        },
    );

    let given = NameTable::from_counts(given?);
    let family = NameTable::from_counts(family?);
    let tables = ReferenceTables::from_tables(given, family);

    info!(
        "Aggregated {} given-name rows and {} family-name rows across {} countries in {:.1}s",
        tables.given.len(),
        tables.family.len(),
        tables.totals.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(tables)
}

/// Column positions resolved from a source's header row
struct SourceColumns {
    country: usize,
    name: usize,
    count: usize,
}

impl SourceColumns {
    fn resolve(headers: &csv::StringRecord, kind: NameKind, path: &Path) -> DataResult<Self> {
        let find = |wanted: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(wanted));

        let country = find(COUNTRY_COLUMN).ok_or_else(|| DataSchemaError::MissingColumn {
            path: path.to_path_buf(),
            column: COUNTRY_COLUMN.to_string(),
        })?;

        let name_column = match kind {
            NameKind::Given => "forename",
            NameKind::Family => "surname",
        };
        let name = find(name_column)
            .or_else(|| find("name"))
            .ok_or_else(|| DataSchemaError::MissingColumn {
                path: path.to_path_buf(),
                column: name_column.to_string(),
            })?;

        let count = COUNT_COLUMNS
            .iter()
            .find_map(|&c| find(c))
            .ok_or_else(|| DataSchemaError::MissingCountColumn {
                path: path.to_path_buf(),
                expected: COUNT_COLUMNS.join(", "),
            })?;

        Ok(Self {
            country,
            name,
            count,
        })
    }
}

fn aggregate_source(path: &Path, kind: NameKind) -> DataResult<NameCounts> {
    let file = std::fs::File::open(path).map_err(|source| DataSchemaError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let csv_err = |source: csv::Error| DataSchemaError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(csv_err)?.clone();
    let columns = SourceColumns::resolve(&headers, kind, path)?;

    info!("Aggregating {} names from {}", kind.name(), path.display());

    let mut counts = NameCounts::default();
    let mut record = csv::StringRecord::new();
    let mut rows = 0u64;
    // Every per-country and global total is bounded by this.
    let mut total = 0u64;

    while reader.read_record(&mut record).map_err(csv_err)? {
        rows += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(rows + 1);

        let country = record.get(columns.country).unwrap_or("").trim();
        let name = normalize_name(record.get(columns.name).unwrap_or(""));
        let count = parse_count(record.get(columns.count).unwrap_or(""))
            .ok_or_else(|| DataSchemaError::InvalidCount {
                path: path.to_path_buf(),
                line,
                value: record.get(columns.count).unwrap_or("").to_string(),
            })?;

        total = total
            .checked_add(count)
            .ok_or_else(|| DataSchemaError::CountOverflow {
                path: path.to_path_buf(),
                line,
            })?;
        *counts.entry((country.to_string(), name)).or_insert(0) += count;

        if rows % PROGRESS_EVERY == 0 {
            info!(
                "  {}: {} rows read, {} distinct (country, name) pairs",
                path.display(),
                rows,
                counts.len()
            );
        }
    }

    debug!(
        "{}: {} rows -> {} aggregated pairs",
        path.display(),
        rows,
        counts.len()
    );
    Ok(counts)
}

/// Parse an occurrence count. Missing values count as zero.
///
/// Whole-number floats ("12.0") are accepted since some exports write counts that way.
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn merge_counts(parts: Vec<NameCounts>) -> DataResult<NameCounts> {
    let overflow = || DataSchemaError::TotalOverflow {
        kind: NameKind::Family.name(),
    };
    // Each part's total already fits; the sum of parts may not.
    parts
        .iter()
        .flat_map(|part| part.values())
        .try_fold(0u64, |acc, &count| acc.checked_add(count))
        .ok_or_else(overflow)?;

    let mut parts = parts.into_iter();
    let mut merged = parts.next().unwrap_or_default();
    for part in parts {
        for (key, count) in part {
            *merged.entry(key).or_insert(0) += count;
        }
    }
    Ok(merged)
}

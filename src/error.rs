//! Error types for the plausibility engine
//!
//! Three families, matching the three ways things go wrong, plus
//! [`StartupError`] wrapping whatever aborts engine initialization:
//!
//! - [`DataSchemaError`]: the raw reference inputs are unusable. Fatal at startup.
//! - [`CacheError`]: the on-disk aggregate is missing or stale. The cache layer
//!   turns these into a rebuild; callers never see them from `AggregateCache::load_or_rebuild`.
//! - [`EngineError`]: a single `evaluate` call failed internally. The caller
//!   decides how to degrade.
//!
//! Bad names and unknown countries are data, not errors, and never produce any of these.

use std::path::PathBuf;
use thiserror::Error;

/// Raw reference data could not be read or does not have the expected shape
#[derive(Error, Debug)]
pub enum DataSchemaError {
    #[error("Failed to open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: no count column found (expected one of: {expected})")]
    MissingCountColumn { path: PathBuf, expected: String },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}:{line}: invalid count value '{value}'")]
    InvalidCount {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path}:{line}: counts overflow a 64-bit total when summed")]
    CountOverflow { path: PathBuf, line: u64 },

    #[error("{kind}-name counts overflow when summed across sources")]
    TotalOverflow { kind: &'static str },

    #[error("{path}: country mapping is empty")]
    EmptyCountryMap { path: PathBuf },

    #[error("{path}: malformed CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type DataResult<T> = Result<T, DataSchemaError>;

/// The on-disk aggregate cannot be used as-is
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache artifact missing: {0}")]
    MissingArtifact(PathBuf),

    #[error("Cache schema version mismatch (found {found}, expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Cache table {0} has no usable hash column")]
    MissingHashColumn(String),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A single evaluation failed for reasons unrelated to its input values
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Non-finite {quantity} while scoring")]
    NonFinite { quantity: &'static str },

    #[error("Evaluation panicked: {0}")]
    Panicked(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine initialization failed. There is no degraded mode for these.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Data(#[from] DataSchemaError),

    #[error("Failed to write aggregate cache: {0}")]
    CacheWrite(#[source] CacheError),
}

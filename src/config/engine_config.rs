//! Engine configuration
//!
//! Supports loading config from (lowest to highest priority):
//! - built-in defaults
//! - ~/.config/eurolita/config.toml
//! - an explicit `--config` file
//! - environment variables (`EUROLITA_DATA_DIR`, `EUROLITA_CACHE_DIR`, `EUROLITA_LOG`)
//!
//! CLI flags are applied on top by the caller.

use crate::cache::paths::default_cache_dir;
use crate::logging::LogSettings;
use crate::lookup::{LookupStrategy, DEFAULT_GLOBAL_CAPACITY, DEFAULT_NAME_CAPACITY};
use crate::reference::DataSources;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_DATA_DIR: &str = "EUROLITA_DATA_DIR";
pub const ENV_CACHE_DIR: &str = "EUROLITA_CACHE_DIR";
pub const ENV_LOG: &str = "EUROLITA_LOG";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_FORENAMES: &str = "forenames_eu.csv";
const DEFAULT_SURNAMES: [&str; 2] = ["surnames_eu_part1.csv", "surnames_eu_part2.csv"];
const DEFAULT_COUNTRY_CODES: &str = "country_codes.csv";
const DEFAULT_LOG_MAX_BYTES: u64 = 5_000_000;
const DEFAULT_LOG_BACKUPS: usize = 3;

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct DataConfig {
    /// Directory holding the raw exports (default: ./data)
    pub dir: Option<PathBuf>,

    /// Given-name export, relative to `dir` unless absolute
    pub forenames: Option<PathBuf>,

    /// Family-name exports, concatenated in order
    pub surnames: Option<Vec<PathBuf>>,

    /// Country name/code table
    pub country_codes: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Aggregate cache directory (default: per-data-dir under the user cache dir)
    pub dir: Option<PathBuf>,

    /// Bound on memoized per-country lookups, per table
    pub name_capacity: Option<u64>,

    /// Bound on memoized global counts, per table
    pub global_capacity: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct LookupConfig {
    /// "hashed" (default) or "scan"
    pub strategy: Option<LookupStrategy>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// error, warn, info, debug, trace (or any EnvFilter directive)
    pub level: Option<String>,

    /// Also log to this file, rotated by size
    pub file: Option<PathBuf>,

    pub max_bytes: Option<u64>,

    pub backups: Option<usize>,
}

impl EngineConfig {
    /// Load config from all sources. An explicit file must exist and parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match Self::from_file(&path) {
                Ok(user_config) => config.merge(user_config),
                Err(e) => warn!("Ignoring user config {}: {:#}", path.display(), e),
            }
        }

        if let Some(path) = explicit {
            config.merge(Self::from_file(path)?);
        }

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("eurolita").join("config.toml"))
    }

    /// Apply environment overrides, reading variables through `get`.
    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = get(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data.dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = get(ENV_CACHE_DIR).filter(|v| !v.is_empty()) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = get(ENV_LOG).filter(|v| !v.is_empty()) {
            self.logging.level = Some(level);
        }
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: EngineConfig) {
        if other.data.dir.is_some() {
            self.data.dir = other.data.dir;
        }
        if other.data.forenames.is_some() {
            self.data.forenames = other.data.forenames;
        }
        if other.data.surnames.is_some() {
            self.data.surnames = other.data.surnames;
        }
        if other.data.country_codes.is_some() {
            self.data.country_codes = other.data.country_codes;
        }
        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }
        if other.cache.name_capacity.is_some() {
            self.cache.name_capacity = other.cache.name_capacity;
        }
        if other.cache.global_capacity.is_some() {
            self.cache.global_capacity = other.cache.global_capacity;
        }
        if other.lookup.strategy.is_some() {
            self.lookup.strategy = other.lookup.strategy;
        }
        if other.logging.level.is_some() {
            self.logging.level = other.logging.level;
        }
        if other.logging.file.is_some() {
            self.logging.file = other.logging.file;
        }
        if other.logging.max_bytes.is_some() {
            self.logging.max_bytes = other.logging.max_bytes;
        }
        if other.logging.backups.is_some() {
            self.logging.backups = other.logging.backups;
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Resolved raw input locations.
    pub fn sources(&self) -> DataSources {
        let dir = self.data_dir();
        let forenames = self
            .data
            .forenames
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FORENAMES));
        let surnames = self
            .data
            .surnames
            .clone()
            .unwrap_or_else(|| DEFAULT_SURNAMES.iter().map(PathBuf::from).collect());
        let country_codes = self
            .data
            .country_codes
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COUNTRY_CODES));

        DataSources {
            forenames: dir.join(forenames),
            surnames: surnames.into_iter().map(|s| dir.join(s)).collect(),
            country_codes: dir.join(country_codes),
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| default_cache_dir(&self.data_dir()))
    }

    pub fn name_capacity(&self) -> u64 {
        self.cache.name_capacity.unwrap_or(DEFAULT_NAME_CAPACITY)
    }

    pub fn global_capacity(&self) -> u64 {
        self.cache.global_capacity.unwrap_or(DEFAULT_GLOBAL_CAPACITY)
    }

    pub fn lookup_strategy(&self) -> LookupStrategy {
        self.lookup.strategy.unwrap_or_default()
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            level: self.logging.level.clone(),
            file: self.logging.file.clone(),
            max_bytes: self.logging.max_bytes.unwrap_or(DEFAULT_LOG_MAX_BYTES),
            backups: self.logging.backups.unwrap_or(DEFAULT_LOG_BACKUPS),
        }
    }

    /// Write a commented example config to `path`.
    ///
    /// Returns `false` without touching anything if the file already exists.
    pub fn write_example(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# Eurolita configuration

[data]
# Directory holding the raw census exports
# dir = "./data"
# forenames = "forenames_eu.csv"
# surnames = ["surnames_eu_part1.csv", "surnames_eu_part2.csv"]
# country_codes = "country_codes.csv"

[cache]
# Aggregate cache location (default: per data directory, under the user cache dir)
# dir = "/var/cache/eurolita"
# name_capacity = 12000
# global_capacity = 25000

[lookup]
# "hashed" (binary search on the name hash) or "scan" (plain equality filter)
# strategy = "hashed"

[logging]
# level = "info"
# file = "eurolita.log"
# max_bytes = 5000000
# backups = 3
"#;

//! Aggregate cache
//!
//! Persists the aggregated reference tables so a process restart skips the
//! full scan of the raw exports. Four artifacts live in the cache directory:
//!
//! - `given_names.bin` / `family_names.bin`: columnar [`NameTable`]s (bitcode)
//! - `country_totals.bin`: per-country denominators (bitcode)
//! - `global_totals.json`: schema version plus global scalars
//!
//! A cache is valid only if all four exist, the sidecar's schema version
//! matches [`CACHE_SCHEMA_VERSION`], and both name tables carry a consistent
//! hash column. Anything else triggers a rebuild. There is no expiry: delete
//! the cache to pick up new raw data.

pub mod paths;

use crate::error::{CacheError, CacheResult, StartupError};
use crate::reference::{
    load_reference_tables, CountryTotal, DataSources, GlobalTotals, NameTable, ReferenceTables,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cache format version - bump when the artifact layout changes
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Scalar sidecar stored next to the table artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSidecar {
    pub schema_version: u32,
    pub generated_at: String,
    #[serde(flatten)]
    pub global: GlobalTotals,
}

/// Where the tables returned by [`AggregateCache::load_or_rebuild`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Loaded,
    Rebuilt,
}

/// Validity of the on-disk cache, for status reporting
#[derive(Debug)]
pub enum CacheStatus {
    Valid(CacheSidecar),
    Invalid(CacheError),
}

/// On-disk store for the aggregated reference tables
#[derive(Debug, Clone)]
pub struct AggregateCache {
    dir: PathBuf,
}

impl AggregateCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a valid cache, or aggregate the raw sources and write a fresh one.
    ///
    /// Cache problems are never returned: they are logged and repaired.
    /// Only unusable raw data or a failed cache write surface as errors.
    pub fn load_or_rebuild(
        &self,
        sources: &DataSources,
    ) -> Result<(ReferenceTables, CacheOutcome), StartupError> {
        match self.load() {
            Ok(tables) => Ok((tables, CacheOutcome::Loaded)),
            Err(CacheError::MissingArtifact(path)) => {
                info!("No aggregate cache at {} ({} missing)", self.dir.display(), path.display());
                Ok((self.rebuild(sources)?, CacheOutcome::Rebuilt))
            }
            Err(e) => {
                warn!("Aggregate cache at {} is unusable: {}", self.dir.display(), e);
                Ok((self.rebuild(sources)?, CacheOutcome::Rebuilt))
            }
        }
    }

    /// Aggregate the raw sources and overwrite the cache.
    pub fn rebuild(&self, sources: &DataSources) -> Result<ReferenceTables, StartupError> {
        info!("Building aggregate cache (one-time)...");
        let tables = load_reference_tables(sources)?;
        self.store(&tables).map_err(StartupError::CacheWrite)?;
        info!("Cache built at {}", self.dir.display());
        Ok(tables)
    }

    /// Load and validate every artifact.
    pub fn load(&self) -> CacheResult<ReferenceTables> {
        let start = Instant::now();
        for path in paths::artifact_paths(&self.dir) {
            if !path.exists() {
                return Err(CacheError::MissingArtifact(path));
            }
        }

        let sidecar = self.read_sidecar()?;

        let given: NameTable = read_artifact(&paths::given_names_path(&self.dir))?;
        if !given.has_hash_column() {
            return Err(CacheError::MissingHashColumn(paths::GIVEN_NAMES_FILE.to_string()));
        }
        let family: NameTable = read_artifact(&paths::family_names_path(&self.dir))?;
        if !family.has_hash_column() {
            return Err(CacheError::MissingHashColumn(paths::FAMILY_NAMES_FILE.to_string()));
        }
        let totals: Vec<CountryTotal> = read_artifact(&paths::country_totals_path(&self.dir))?;

        info!(
            "Loaded aggregate cache from {} ({} + {} rows, {} countries) in {}ms",
            self.dir.display(),
            given.len(),
            family.len(),
            totals.len(),
            start.elapsed().as_millis()
        );

        Ok(ReferenceTables {
            given,
            family,
            totals,
            global: sidecar.global,
        })
    }

    /// Read and version-check the scalar sidecar.
    pub fn read_sidecar(&self) -> CacheResult<CacheSidecar> {
        let path = paths::global_totals_path(&self.dir);
        if !path.exists() {
            return Err(CacheError::MissingArtifact(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        let sidecar: CacheSidecar =
            serde_json::from_reader(reader).map_err(|e| CacheError::Decode {
                path: path.clone(),
                message: e.to_string(),
            })?;

        if sidecar.schema_version != CACHE_SCHEMA_VERSION {
            return Err(CacheError::VersionMismatch {
                found: sidecar.schema_version,
                expected: CACHE_SCHEMA_VERSION,
            });
        }
        Ok(sidecar)
    }

    /// Write all artifacts. Each one goes to a temp file and is renamed into place.
    pub fn store(&self, tables: &ReferenceTables) -> CacheResult<()> {
        fs::create_dir_all(&self.dir)?;

        // Until the new sidecar lands the cache reads as invalid, so an
        // interrupted write can never pair old scalars with new tables.
        let sidecar_path = paths::global_totals_path(&self.dir);
        if sidecar_path.exists() {
            fs::remove_file(&sidecar_path)?;
        }

        write_artifact(&paths::given_names_path(&self.dir), &tables.given)?;
        write_artifact(&paths::family_names_path(&self.dir), &tables.family)?;
        write_artifact(&paths::country_totals_path(&self.dir), &tables.totals)?;

        let sidecar = CacheSidecar {
            schema_version: CACHE_SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            global: tables.global,
        };
        let json = serde_json::to_vec_pretty(&sidecar).map_err(|e| CacheError::Encode {
            path: sidecar_path.clone(),
            message: e.to_string(),
        })?;
        write_atomic(&sidecar_path, &json)?;

        debug!("Saved aggregate cache to {}", self.dir.display());
        Ok(())
    }

    pub fn status(&self) -> CacheStatus {
        match self.load().and_then(|_| self.read_sidecar()) {
            Ok(sidecar) => CacheStatus::Valid(sidecar),
            Err(e) => CacheStatus::Invalid(e),
        }
    }

    /// Delete the cache artifacts. Returns how many files were removed.
    ///
    /// Only known artifact files are touched; the directory itself is removed
    /// afterwards only if that leaves it empty.
    pub fn clear(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        for path in paths::removable_paths(&self.dir) {
            if path.exists() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if self.dir.exists() && fs::read_dir(&self.dir)?.next().is_none() {
            fs::remove_dir(&self.dir)?;
        }
        Ok(removed)
    }
}

fn write_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> CacheResult<()> {
    let bytes = bitcode::serialize(value).map_err(|e| CacheError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, &bytes)
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> CacheResult<T> {
    let bytes = fs::read(path)?;
    bitcode::deserialize(&bytes).map_err(|e| CacheError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write to a temp file first, then rename (atomic on POSIX)
fn write_atomic(path: &Path, bytes: &[u8]) -> CacheResult<()> {
    let tmp_file = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_file)?);
    writer.write_all(bytes)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    fs::rename(&tmp_file, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sources(dir: &Path) -> DataSources {
        let forenames = dir.join("forenames.csv");
        let surnames = dir.join("surnames.csv");
        fs::write(
            &forenames,
            "country,forename,count\nDE,Anna,6\nPL,Anna,2\nPL,Zofia,4\n",
        )
        .unwrap();
        fs::write(
            &surnames,
            "country,surname,count\nDE,Müller,7\nPL,Kowalska,5\n",
        )
        .unwrap();
        DataSources {
            forenames,
            surnames: vec![surnames],
            country_codes: dir.join("country_codes.csv"),
        }
    }

    #[test]
    fn test_first_open_rebuilds_then_loads() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path().join("agg"));

        let (built, outcome) = cache.load_or_rebuild(&sources).unwrap();
        assert_eq!(outcome, CacheOutcome::Rebuilt);

        let (loaded, outcome) = cache.load_or_rebuild(&sources).unwrap();
        assert_eq!(outcome, CacheOutcome::Loaded);
        assert_eq!(built, loaded);
    }

    #[test]
    fn test_version_mismatch_triggers_rebuild() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path());
        cache.rebuild(&sources).unwrap();

        let sidecar_path = paths::global_totals_path(cache_dir.path());
        let mut sidecar: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&sidecar_path).unwrap()).unwrap();
        sidecar["schema_version"] = serde_json::json!(CACHE_SCHEMA_VERSION + 1);
        fs::write(&sidecar_path, sidecar.to_string()).unwrap();

        assert!(matches!(
            cache.load(),
            Err(CacheError::VersionMismatch { .. })
        ));
        let (_, outcome) = cache.load_or_rebuild(&sources).unwrap();
        assert_eq!(outcome, CacheOutcome::Rebuilt);
        assert!(matches!(cache.status(), CacheStatus::Valid(_)));
    }

    #[test]
    fn test_missing_artifact_is_invalid() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path());
        cache.rebuild(&sources).unwrap();

        fs::remove_file(paths::family_names_path(cache_dir.path())).unwrap();
        assert!(matches!(cache.load(), Err(CacheError::MissingArtifact(_))));
    }

    #[test]
    fn test_garbage_table_is_invalid() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path());
        cache.rebuild(&sources).unwrap();

        fs::write(paths::given_names_path(cache_dir.path()), b"").unwrap();
        assert!(cache.load().is_err());
        let (tables, outcome) = cache.load_or_rebuild(&sources).unwrap();
        assert_eq!(outcome, CacheOutcome::Rebuilt);
        assert_eq!(tables.global.given_total, 12);
    }

    #[test]
    fn test_legacy_sidecar_is_invalid() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path());
        cache.rebuild(&sources).unwrap();

        fs::write(
            paths::global_totals_path(cache_dir.path()),
            r#"{"GLOBAL_FORENAME_TOTAL": 12, "V_FORENAMES": 2}"#,
        )
        .unwrap();
        assert!(matches!(cache.read_sidecar(), Err(CacheError::Decode { .. })));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let data = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let a = AggregateCache::new(first.path()).rebuild(&sources).unwrap();
        let b = AggregateCache::new(second.path()).rebuild(&sources).unwrap();
        assert_eq!(a.totals, b.totals);
        assert_eq!(a.global, b.global);

        for file in [
            paths::GIVEN_NAMES_FILE,
            paths::FAMILY_NAMES_FILE,
            paths::COUNTRY_TOTALS_FILE,
        ] {
            assert_eq!(
                fs::read(first.path().join(file)).unwrap(),
                fs::read(second.path().join(file)).unwrap(),
                "{file} differs between builds"
            );
        }
    }

    #[test]
    fn test_clear_only_removes_artifacts() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        let cache = AggregateCache::new(cache_dir.path());
        cache.rebuild(&sources).unwrap();
        fs::write(cache_dir.path().join("keep.txt"), "x").unwrap();

        assert_eq!(cache.clear().unwrap(), 4);
        assert!(cache_dir.path().join("keep.txt").exists());
        assert!(matches!(cache.status(), CacheStatus::Invalid(_)));
    }

    #[test]
    fn test_schema_error_surfaces_from_rebuild() {
        let data = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let sources = write_sources(data.path());
        fs::write(&sources.forenames, "country,forename,total\nDE,Anna,1\n").unwrap();

        let err = AggregateCache::new(cache_dir.path())
            .load_or_rebuild(&sources)
            .unwrap_err();
        assert!(matches!(err, StartupError::Data(_)));
    }
}

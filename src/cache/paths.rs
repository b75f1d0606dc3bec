//! Cache path utilities - uses ~/.cache/eurolita/<data-hash>/ unless configured

use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

pub const GIVEN_NAMES_FILE: &str = "given_names.bin";
pub const FAMILY_NAMES_FILE: &str = "family_names.bin";
pub const COUNTRY_TOTALS_FILE: &str = "country_totals.bin";
pub const GLOBAL_TOTALS_FILE: &str = "global_totals.json";

/// Default cache directory for a reference data directory.
/// Uses ~/.cache/eurolita/<data-hash>/ on Unix, %LOCALAPPDATA%/eurolita/<data-hash>/ on Windows.
pub fn default_cache_dir(data_dir: &Path) -> PathBuf {
    let data_hash = hash_path(data_dir);

    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            // Fallback to ~/.cache
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("eurolita").join(&data_hash)
}

pub fn given_names_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(GIVEN_NAMES_FILE)
}

pub fn family_names_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(FAMILY_NAMES_FILE)
}

pub fn country_totals_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(COUNTRY_TOTALS_FILE)
}

pub fn global_totals_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(GLOBAL_TOTALS_FILE)
}

/// All artifacts, sidecar last.
pub fn artifact_paths(cache_dir: &Path) -> [PathBuf; 4] {
    [
        given_names_path(cache_dir),
        family_names_path(cache_dir),
        country_totals_path(cache_dir),
        global_totals_path(cache_dir),
    ]
}

/// Every file `clean` may remove: each artifact plus a leftover `.tmp`
/// from an interrupted write.
pub fn removable_paths(cache_dir: &Path) -> Vec<PathBuf> {
    artifact_paths(cache_dir)
        .into_iter()
        .flat_map(|path| [path.with_extension("tmp"), path])
        .collect()
}

/// Hash a path to create a unique but deterministic directory name.
/// Uses the canonical path to ensure consistency.
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();
    let hash = xxh3_64(path_str.as_bytes());

    // Use canonical path's file_name for consistent naming (important when path is ".")
    let dir_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(20)
        .collect::<String>();

    format!("{}-{:012x}", dir_name, hash & 0xffff_ffff_ffff)
}

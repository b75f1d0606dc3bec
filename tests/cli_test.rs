//! Integration tests for the eurolita CLI
//!
//! These run the built binary against the fixture exports. Each test uses
//! its own temp cache directory and an empty config home so a user config on
//! the host cannot leak in.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn eurolita(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_eurolita"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("EUROLITA_DATA_DIR")
        .env_remove("EUROLITA_CACHE_DIR")
        .env_remove("EUROLITA_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run eurolita")
}

fn with_data<'a>(cache: &'a str, data: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut full = args.to_vec();
    full.extend(["--data-dir", data, "--cache-dir", cache, "--log-level", "warn"]);
    full
}

#[test]
fn test_check_json() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("agg");
    let data = fixtures_path();
    let args = with_data(
        cache.to_str().unwrap(),
        data.to_str().unwrap(),
        &["check", "Anna", "Müller", "Germany", "--format", "json"],
    );

    let output = eurolita(home.path(), &args);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["plausibility_label"], "Very typical");
    assert_eq!(json["claimed_rank"], 1);
    assert_eq!(json["top_country"], "Germany");
    assert_eq!(json["ranked_countries"][0]["is_claimed"], true);
}

#[test]
fn test_check_text() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("agg");
    let data = fixtures_path();
    let args = with_data(
        cache.to_str().unwrap(),
        data.to_str().unwrap(),
        &["check", "Xzqwerty", "Blablablinsky", "Atlantis"],
    );

    let output = eurolita(home.path(), &args);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Very unusual"));
    assert!(stdout.contains("rank unknown"));
}

#[test]
fn test_build_then_status_then_clean() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("agg");
    let cache_str = cache.to_str().unwrap();
    let data = fixtures_path();
    let data_str = data.to_str().unwrap();

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["build"]));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Built"));

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["build"]));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Loaded"));

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["status"]));
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Aggregate cache valid"));

    let output = eurolita(
        home.path(),
        &with_data(cache_str, data_str, &["clean", "--dry-run"]),
    );
    assert!(output.status.success());
    assert!(paths_exist(&cache));

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["clean"]));
    assert!(output.status.success());
    assert!(!paths_exist(&cache));
}

#[test]
fn test_clean_lists_leftover_tmp_files() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("agg");
    let cache_str = cache.to_str().unwrap();
    let data = fixtures_path();
    let data_str = data.to_str().unwrap();

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["build"]));
    assert!(output.status.success());
    // What an interrupted write leaves next to the artifacts
    std::fs::write(cache.join("given_names.tmp"), b"partial").unwrap();

    let output = eurolita(
        home.path(),
        &with_data(cache_str, data_str, &["clean", "--dry-run"]),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 5 cache files"), "stdout: {stdout}");
    assert!(stdout.contains("given_names.tmp"));

    let output = eurolita(home.path(), &with_data(cache_str, data_str, &["clean"]));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Removed 5 files."), "stdout: {stdout}");
    assert!(!cache.join("given_names.tmp").exists());
}

fn paths_exist(cache: &Path) -> bool {
    cache.join("global_totals.json").exists()
}

#[test]
fn test_missing_data_fails_at_startup() {
    let home = TempDir::new().unwrap();
    let cache = home.path().join("agg");
    let empty = home.path().join("no-data");
    let args = with_data(
        cache.to_str().unwrap(),
        empty.to_str().unwrap(),
        &["check", "Anna", "Müller", "Germany"],
    );

    let output = eurolita(home.path(), &args);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load reference data"));
}

#[test]
fn test_bad_count_column_is_reported() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    for file in ["surnames_eu_part1.csv", "surnames_eu_part2.csv", "country_codes.csv"] {
        std::fs::copy(fixtures_path().join(file), data.join(file)).unwrap();
    }
    std::fs::write(data.join("forenames_eu.csv"), "country,forename,total\nDE,Anna,1\n").unwrap();

    let cache = home.path().join("agg");
    let args = with_data(
        cache.to_str().unwrap(),
        data.to_str().unwrap(),
        &["check", "Anna", "Müller", "Germany"],
    );
    let output = eurolita(home.path(), &args);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("count"));
    assert!(stderr.contains("frequency"));
}

#[test]
fn test_init_writes_config() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("eurolita.toml");
    let output = eurolita(home.path(), &["init", "--config", path.to_str().unwrap()]);
    assert!(output.status.success());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[data]"));
    assert!(content.contains("[lookup]"));
}

#[test]
fn test_config_file_supplies_data_dir() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("eurolita.toml");
    std::fs::write(
        &config,
        format!(
            "[data]\ndir = {:?}\n\n[cache]\ndir = {:?}\n\n[lookup]\nstrategy = \"scan\"\n",
            fixtures_path().to_str().unwrap(),
            home.path().join("agg").to_str().unwrap()
        ),
    )
    .unwrap();

    let output = eurolita(
        home.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "check",
            "Zofia",
            "Kowalska",
            "PL",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["top_country"], "Poland");
}

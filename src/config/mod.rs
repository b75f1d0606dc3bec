//! Configuration for eurolita
//!
//! This module handles:
//! - Raw data and cache locations
//! - Lookup strategy and memo bounds
//! - Logging level and log file rotation

mod engine_config;

pub use engine_config::{
    CacheConfig, DataConfig, EngineConfig, LoggingConfig, LookupConfig, ENV_CACHE_DIR,
    ENV_DATA_DIR, ENV_LOG, EXAMPLE_CONFIG,
};

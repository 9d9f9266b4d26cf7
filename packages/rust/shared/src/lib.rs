//! Shared types, error model, and configuration for TenderScout.
//!
//! This crate is the foundation depended on by all other TenderScout crates.
//! It provides:
//! - [`TenderScoutError`]: the unified error type
//! - Manifest schema ([`ManifestEntry`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DownloadConfig, NavigationConfig, NavigationTimings, PageEngine, RetryPolicy,
    RunConfig, RunDefaults, VocabularyConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, render_config,
};
pub use error::{Result, TenderScoutError};
pub use types::ManifestEntry;

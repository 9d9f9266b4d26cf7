//! Crawl-run orchestration for TenderScout.
//!
//! This crate ties the crawler building blocks together into a single run
//! (`run_crawl`) and owns the manifest the run produces.

pub mod manifest;
pub mod pipeline;

pub use manifest::{ManifestBuilder, read_manifest, write_manifest};
pub use pipeline::{
    CrawlReport, ProgressReporter, RunStats, SilentProgress, run_crawl, run_crawl_with,
};

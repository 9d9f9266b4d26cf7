//! Listing-page crawling, relevance filtering, and document retrieval.
//!
//! This crate provides:
//! - [`page`]: the [`Page`] capability with the [`ChromiumPage`] and static [`HttpPage`] engines
//! - [`navigator`]: listing-page load detection
//! - [`candidates`]: candidate link discovery
//! - [`context`]: container text around a link ([`ContainerStrategy`])
//! - [`dates`] and [`relevance`]: date extraction and keyword/recency filtering
//! - [`resolver`]: direct vs. detail-page document resolution
//! - [`downloader`]: retrying, idempotent document downloads

pub mod candidates;
pub mod context;
pub mod dates;
pub mod downloader;
pub mod navigator;
pub mod page;
pub mod relevance;
pub mod resolver;

pub use candidates::{Candidate, CandidateExtractor, LinkHeuristics};
pub use context::{AncestorWalk, ContainerStrategy, collapse_whitespace, resolve_context};
pub use dates::{RecencyWindow, extract_dates};
pub use downloader::{Downloader, filename_from_url};
pub use navigator::{LoadSignal, Navigator};
pub use page::{ChromiumPage, ElementHandle, HttpPage, Page};
pub use relevance::{RelevanceFilter, Verdict};
pub use resolver::{DocumentResolver, ResolutionKind, ResolveOutcome, ResolvedDocument};

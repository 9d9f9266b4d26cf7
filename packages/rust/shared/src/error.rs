//! Error types for TenderScout.
//!
//! Library crates use [`TenderScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all TenderScout operations.
#[derive(Debug, thiserror::Error)]
pub enum TenderScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Page load, detail-page or back navigation failed.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// DOM query or evaluation error on the current page.
    #[error("dom error: {message}")]
    Dom { message: String },

    /// An element handle was used after the page it belongs to went away.
    #[error("stale element handle (issued for generation {issued}, page is at {current})")]
    StaleHandle { issued: u64, current: u64 },

    /// The rendering browser could not be launched or driven.
    #[error("browser error: {0}")]
    Browser(String),

    /// Network/HTTP error outside of page navigation.
    #[error("network error: {0}")]
    Network(String),

    /// A document download exhausted its attempts.
    #[error("download error: {0}")]
    Download(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Manifest serialization or persistence error.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Data validation error (bad URL, empty vocabulary, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TenderScoutError>;

impl TenderScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a navigation error from any displayable message.
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create a DOM error from any displayable message.
    pub fn dom(msg: impl Into<String>) -> Self {
        Self::Dom {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from page navigation (and may be recovered by reloading).
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation(_) | Self::StaleHandle { .. })
    }
}

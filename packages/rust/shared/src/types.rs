//! Persisted domain types for TenderScout manifests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ManifestEntry
// ---------------------------------------------------------------------------

/// One retrieved document in the manifest JSON array.
///
/// Field names are a compatibility contract with downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Visible text of the link the document was found through.
    pub title: String,
    /// Absolute URL of the document; the entry's identity key.
    #[serde(rename = "pdf_url")]
    pub document_url: String,
    /// Where the document was saved locally.
    #[serde(rename = "download_path")]
    pub local_path: PathBuf,
    /// Whitespace-collapsed text surrounding the link on the listing page.
    #[serde(rename = "context")]
    pub context_text: String,
}

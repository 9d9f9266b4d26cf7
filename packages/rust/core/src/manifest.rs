//! Manifest building and persistence.
//!
//! Entries accumulate in discovery order, are deduplicated by document URL
//! once (first occurrence wins), and are written with a single whole-file
//! replace.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::info;

use tenderscout_shared::{ManifestEntry, Result, TenderScoutError};

/// Collects manifest entries for one run.
#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries unique by `document_url`, keeping the first seen, in discovery order.
    pub fn finish(self) -> Vec<ManifestEntry> {
        let mut seen = HashSet::new();
        self.entries
            .into_iter()
            .filter(|entry| seen.insert(entry.document_url.clone()))
            .collect()
    }
}

/// Write `entries` as a pretty-printed JSON array, replacing any existing file.
///
/// The content goes to a sibling temp file first and is renamed into place.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| TenderScoutError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| TenderScoutError::Manifest(format!("serialize failed: {e}")))?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(|e| TenderScoutError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        TenderScoutError::io(path, e)
    })?;

    info!(entries = entries.len(), path = %path.display(), "manifest saved");
    Ok(())
}

/// Read a manifest written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| TenderScoutError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| TenderScoutError::Manifest(format!("{}: {e}", path.display())))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(title: &str, url: &str) -> ManifestEntry {
        ManifestEntry {
            title: title.into(),
            document_url: url.into(),
            local_path: PathBuf::from(format!("data/raw/{title}.pdf")),
            context_text: format!("context for {title}"),
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let mut builder = ManifestBuilder::new();
        builder.push(entry("a", "https://x.example/a.pdf"));
        builder.push(entry("b", "https://x.example/b.pdf"));
        builder.push(entry("a-again", "https://x.example/a.pdf"));
        builder.push(entry("upper", "https://x.example/A.pdf"));
        assert_eq!(builder.len(), 4);

        let entries = builder.finish();
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "upper"]);
    }

    #[test]
    fn write_replaces_whole_file() {
        let dir = std::env::temp_dir().join(format!("ts-manifest-{}", Uuid::now_v7()));
        let path = dir.join("out").join("manifest.json");

        write_manifest(&path, &[entry("a", "u1"), entry("b", "u2")]).unwrap();
        write_manifest(&path, &[entry("c", "u3")]).unwrap();

        let read = read_manifest(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].title, "c");
        assert!(!temp_path(&path).exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_manifest_is_an_empty_array() {
        let dir = std::env::temp_dir().join(format!("ts-manifest-{}", Uuid::now_v7()));
        let path = dir.join("manifest.json");

        write_manifest(&path, &[]).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "[]");

        let _ = std::fs::remove_dir_all(&dir);
    }
}

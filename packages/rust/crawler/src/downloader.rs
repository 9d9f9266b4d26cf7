//! Document downloads with retry and filename-keyed idempotence.
//!
//! The on-disk name is derived from the URL, so a second request for the
//! same URL (or any URL sanitizing to the same name) is served from disk.

use std::path::{Path, PathBuf};

use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use url::Url;

use tenderscout_shared::{Result, RetryPolicy, TenderScoutError};

/// Characters no common filesystem accepts in a file name.
const ILLEGAL_FILENAME_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Derive a safe local filename for a document URL.
///
/// Uses the last path segment, strips illegal characters and appends the
/// document extension when missing. A download script whose query names the
/// file (`/download.php?file=nit42.pdf`) is named after that query value.
/// URLs without a usable segment get a name derived from a hash of the URL.
pub fn filename_from_url(url: &Url, extension: &str) -> String {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let suffix = format!(".{extension}");
    let path_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
        .to_string();
    let segment = if path_segment.to_lowercase().ends_with(&suffix) {
        path_segment
    } else {
        url.query_pairs()
            .map(|(_, value)| value)
            .filter(|value| value.to_lowercase().ends_with(&suffix))
            .last()
            .and_then(|value| value.rsplit(['/', '\\']).next().map(str::to_string))
            .unwrap_or(path_segment)
    };

    let mut name: String = segment
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();

    if name.is_empty() || name == "." || name == ".." {
        name = format!("document_{}", &url_digest(url)[..16]);
    }
    if !name.to_lowercase().ends_with(&suffix) {
        name.push('.');
        name.push_str(&extension);
    }
    name
}

fn url_digest(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Streams documents to disk, retrying transient failures.
pub struct Downloader {
    client: Client,
    retry: RetryPolicy,
    extension: String,
}

impl Downloader {
    pub fn new(user_agent: &str, retry: RetryPolicy, extension: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(retry.request_timeout)
            .build()
            .map_err(|e| TenderScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            retry,
            extension: extension.to_string(),
        })
    }

    /// Download `url` into `dir`, returning the local path.
    ///
    /// An existing file with the derived name short-circuits the transfer.
    pub async fn fetch(&self, url: &Url, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| TenderScoutError::io(dir, e))?;

        let out_path = dir.join(filename_from_url(url, &self.extension));
        if tokio::fs::try_exists(&out_path).await.unwrap_or(false) {
            info!(path = %out_path.display(), "file already exists, skipping");
            return Ok(out_path);
        }

        for attempt in 1..=self.retry.max_attempts {
            info!(%url, attempt, "downloading");
            match self.download_once(url, &out_path).await {
                Ok(()) => {
                    info!(path = %out_path.display(), "saved");
                    return Ok(out_path);
                }
                Err(e) => {
                    warn!(%url, attempt, error = %e, "download attempt failed");
                    if attempt < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    }
                }
            }
        }

        error!(%url, attempts = self.retry.max_attempts, "giving up on download");
        Err(TenderScoutError::Download(format!(
            "{url}: failed after {} attempts",
            self.retry.max_attempts
        )))
    }

    /// One attempt: stream into a `.part` file, rename on success, remove on failure.
    async fn download_once(&self, url: &Url, out_path: &Path) -> Result<()> {
        let part_path = part_path(out_path);
        let result = self.stream_to(url, &part_path).await;
        match result {
            Ok(()) => tokio::fs::rename(&part_path, out_path)
                .await
                .map_err(|e| TenderScoutError::io(out_path, e)),
            Err(e) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &Url, part_path: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TenderScoutError::Network(format!("{url}: {e}")))?;

        let mut file = tokio::fs::File::create(part_path)
            .await
            .map_err(|e| TenderScoutError::io(part_path, e))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TenderScoutError::Network(format!("{url}: body read failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| TenderScoutError::io(part_path, e))?;
        }

        file.flush().await.map_err(|e| TenderScoutError::io(part_path, e))?;
        Ok(())
    }
}

fn part_path(out_path: &Path) -> PathBuf {
    let mut name = out_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    out_path.with_file_name(name)
}

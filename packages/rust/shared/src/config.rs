//! Application configuration for TenderScout.
//!
//! User config lives at `~/.tenderscout/tenderscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TenderScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "tenderscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".tenderscout";

/// Procurement terms matched against a candidate's context text.
///
/// The trailing equipment terms reflect one portal's catalogue; edit the
/// `[vocabulary]` list per portal.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "tender",
    "procurement",
    "gem",
    "notice inviting tender",
    "nit",
    "corrigendum",
    "e-tender",
    "invitation for bids",
    "ifb",
    "request for proposal",
    "rfp",
    "supply of",
    "installation of",
    "lit night",
    "extension",
    "open pan evaporimeter",
    "evaporimeter",
    "rain gauge",
    "self recording",
    "siphoning",
    "rainfall simulator",
    "matlab",
    "fpga development",
    "programmable dc power supply",
    "regenerative ac electronic load",
    "device characterization",
    "ftir spectrometer",
    "fourier transform infra red",
];

/// Header written above the generated config file.
const CONFIG_HEADER: &str = "\
# TenderScout configuration.
#
# [vocabulary].keywords decides which listing entries count as relevant.
# The defaults mix generic procurement terms with equipment names from one
# portal; replace them with the terms your target portal uses.

";

/// Link texts that suggest a link leads to a document or its detail page.
pub const DEFAULT_ACTION_WORDS: &[&str] = &["view", "download", "details"];

/// Generic "list/table/card" selectors awaited when no keyword shows up.
pub const DEFAULT_WAIT_SELECTORS: &[&str] = &[
    ".tender-card",
    ".tender-item",
    ".tender-row",
    ".tender-list",
    ".notice-card",
    "table",
    ".list-group",
    "div.notice",
];

// ---------------------------------------------------------------------------
// Config structs (matching tenderscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run defaults.
    #[serde(default)]
    pub run: RunDefaults,

    /// Keyword and action-word vocabularies.
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Page-load detection and DOM heuristics.
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Download retry policy.
    #[serde(default)]
    pub download: DownloadConfig,
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    /// Destination for downloaded documents.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Where the manifest JSON is written.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Render pages off-screen.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Upper bound on accepted candidates per run.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Trailing window for the recency test, in months.
    #[serde(default = "default_recency_months")]
    pub recency_months: u32,

    /// Extension (without dot) identifying a document resource.
    #[serde(default = "default_document_extension")]
    pub document_extension: String,

    /// User-Agent sent by the page engine and the downloader.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page engine: `chromium` renders scripts, `http` parses the served HTML.
    #[serde(default)]
    pub engine: PageEngine,

    /// Chrome/Chromium binary; auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_executable: Option<String>,
}

/// Which page engine drives a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageEngine {
    /// Headless (or headed) Chromium over the DevTools protocol.
    #[default]
    Chromium,
    /// Plain HTTP fetch and parse, no script execution.
    Http,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            manifest_path: default_manifest_path(),
            headless: true,
            max_candidates: default_max_candidates(),
            recency_months: default_recency_months(),
            document_extension: default_document_extension(),
            user_agent: default_user_agent(),
            engine: PageEngine::default(),
            browser_executable: None,
        }
    }
}

fn default_download_dir() -> String {
    "data/raw".into()
}
fn default_manifest_path() -> String {
    "scraped_rfps_manifest.json".into()
}
fn default_true() -> bool {
    true
}
fn default_max_candidates() -> usize {
    50
}
fn default_recency_months() -> u32 {
    3
}
fn default_document_extension() -> String {
    "pdf".into()
}
fn default_user_agent() -> String {
    concat!("TenderScout/", env!("CARGO_PKG_VERSION")).into()
}

/// `[vocabulary]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Relevance keywords (case-insensitive substring match).
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Link texts that make a non-document href a candidate.
    #[serde(default = "default_action_words")]
    pub action_words: Vec<String>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            action_words: default_action_words(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_action_words() -> Vec<String> {
    DEFAULT_ACTION_WORDS.iter().map(|s| s.to_string()).collect()
}

/// `[navigation]` section. All durations are milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Selectors awaited when no keyword text appears.
    #[serde(default = "default_wait_selectors")]
    pub wait_selectors: Vec<String>,

    /// Tags treated as row/card containers by the ancestor walk.
    #[serde(default = "default_container_tags")]
    pub container_tags: Vec<String>,

    /// Class-name fragments treated as row/card containers.
    #[serde(default = "default_container_class_hints")]
    pub container_class_hints: Vec<String>,

    #[serde(default = "default_page_load_timeout_ms")]
    pub page_load_timeout_ms: u64,

    #[serde(default = "default_content_wait_timeout_ms")]
    pub content_wait_timeout_ms: u64,

    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,

    #[serde(default = "default_scroll_bottom_pause_ms")]
    pub scroll_bottom_pause_ms: u64,

    #[serde(default = "default_scroll_top_pause_ms")]
    pub scroll_top_pause_ms: u64,

    #[serde(default = "default_detail_timeout_ms")]
    pub detail_timeout_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            wait_selectors: default_wait_selectors(),
            container_tags: default_container_tags(),
            container_class_hints: default_container_class_hints(),
            page_load_timeout_ms: default_page_load_timeout_ms(),
            content_wait_timeout_ms: default_content_wait_timeout_ms(),
            fallback_delay_ms: default_fallback_delay_ms(),
            scroll_bottom_pause_ms: default_scroll_bottom_pause_ms(),
            scroll_top_pause_ms: default_scroll_top_pause_ms(),
            detail_timeout_ms: default_detail_timeout_ms(),
        }
    }
}

fn default_wait_selectors() -> Vec<String> {
    DEFAULT_WAIT_SELECTORS.iter().map(|s| s.to_string()).collect()
}
fn default_container_tags() -> Vec<String> {
    vec!["tr".into(), "li".into()]
}
fn default_container_class_hints() -> Vec<String> {
    vec!["row".into(), "card".into(), "item".into()]
}
fn default_page_load_timeout_ms() -> u64 {
    20_000
}
fn default_content_wait_timeout_ms() -> u64 {
    5_000
}
fn default_fallback_delay_ms() -> u64 {
    3_000
}
fn default_scroll_bottom_pause_ms() -> u64 {
    1_000
}
fn default_scroll_top_pause_ms() -> u64 {
    500
}
fn default_detail_timeout_ms() -> u64 {
    10_000
}

/// `[download]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Attempts per document before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base of the linear backoff: attempt `n` sleeps `base + n * base`.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}
fn default_request_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Timeouts and pauses used by page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTimings {
    pub page_load: Duration,
    pub content_wait: Duration,
    pub fallback_delay: Duration,
    pub scroll_bottom_pause: Duration,
    pub scroll_top_pause: Duration,
    pub detail: Duration,
}

impl NavigationTimings {
    /// All waits zeroed except navigation timeouts (for tests against local servers).
    pub fn immediate() -> Self {
        Self {
            page_load: Duration::from_secs(5),
            content_wait: Duration::ZERO,
            fallback_delay: Duration::ZERO,
            scroll_bottom_pause: Duration::ZERO,
            scroll_top_pause: Duration::ZERO,
            detail: Duration::from_secs(5),
        }
    }
}

impl From<&NavigationConfig> for NavigationTimings {
    fn from(nav: &NavigationConfig) -> Self {
        Self {
            page_load: Duration::from_millis(nav.page_load_timeout_ms),
            content_wait: Duration::from_millis(nav.content_wait_timeout_ms),
            fallback_delay: Duration::from_millis(nav.fallback_delay_ms),
            scroll_bottom_pause: Duration::from_millis(nav.scroll_bottom_pause_ms),
            scroll_top_pause: Duration::from_millis(nav.scroll_top_pause_ms),
            detail: Duration::from_millis(nav.detail_timeout_ms),
        }
    }
}

/// Download retry policy in runtime form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl RetryPolicy {
    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay + self.base_delay * attempt
    }
}

impl From<&DownloadConfig> for RetryPolicy {
    fn from(download: &DownloadConfig) -> Self {
        Self {
            max_attempts: download.max_attempts,
            base_delay: Duration::from_millis(download.retry_base_delay_ms),
            request_timeout: Duration::from_secs(download.request_timeout_secs),
        }
    }
}

/// Runtime configuration for one crawl run, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Listing page to crawl.
    pub start_url: Url,
    /// Destination for downloaded documents.
    pub download_dir: PathBuf,
    /// Manifest output path.
    pub manifest_path: PathBuf,
    /// Render pages off-screen.
    pub headless: bool,
    /// Page engine driving the run.
    pub engine: PageEngine,
    /// Explicit Chrome/Chromium binary, if configured.
    pub browser_executable: Option<PathBuf>,
    /// Upper bound on accepted candidates.
    pub max_candidates: usize,
    /// Trailing recency window in months.
    pub recency_months: u32,
    /// Document extension without the leading dot, lowercase.
    pub document_extension: String,
    /// User-Agent for page and document requests.
    pub user_agent: String,
    /// Relevance keywords.
    pub keywords: Vec<String>,
    /// Action words for candidate links.
    pub action_words: Vec<String>,
    /// Generic content selectors for load detection.
    pub wait_selectors: Vec<String>,
    /// Container tags for the ancestor walk.
    pub container_tags: Vec<String>,
    /// Container class hints for the ancestor walk.
    pub container_class_hints: Vec<String>,
    /// Navigation timeouts and pauses.
    pub timings: NavigationTimings,
    /// Download retry policy.
    pub retry: RetryPolicy,
}

impl RunConfig {
    /// Build a run config from file defaults for the given start URL.
    pub fn from_app(config: &AppConfig, start_url: Url) -> Self {
        Self {
            start_url,
            download_dir: PathBuf::from(&config.run.download_dir),
            manifest_path: PathBuf::from(&config.run.manifest_path),
            headless: config.run.headless,
            engine: config.run.engine,
            browser_executable: config.run.browser_executable.as_ref().map(PathBuf::from),
            max_candidates: config.run.max_candidates,
            recency_months: config.run.recency_months,
            document_extension: config
                .run
                .document_extension
                .trim_start_matches('.')
                .to_lowercase(),
            user_agent: config.run.user_agent.clone(),
            keywords: config.vocabulary.keywords.clone(),
            action_words: config.vocabulary.action_words.clone(),
            wait_selectors: config.navigation.wait_selectors.clone(),
            container_tags: config.navigation.container_tags.clone(),
            container_class_hints: config.navigation.container_class_hints.clone(),
            timings: NavigationTimings::from(&config.navigation),
            retry: RetryPolicy::from(&config.download),
        }
    }

    /// Check the invariants a run depends on.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.start_url.scheme(), "http" | "https") {
            return Err(TenderScoutError::validation(format!(
                "start_url must be http(s), got {}",
                self.start_url
            )));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(TenderScoutError::validation(
                "keyword vocabulary must not be empty",
            ));
        }
        if self.max_candidates == 0 {
            return Err(TenderScoutError::validation("max_candidates must be at least 1"));
        }
        if self.recency_months == 0 {
            return Err(TenderScoutError::validation("recency_months must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(TenderScoutError::validation("max_attempts must be at least 1"));
        }
        if self.document_extension.is_empty() {
            return Err(TenderScoutError::validation("document_extension must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.tenderscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TenderScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.tenderscout/tenderscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TenderScoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        TenderScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Serialize `config` as a commented TOML file.
pub fn render_config(config: &AppConfig) -> Result<String> {
    let body =
        toml::to_string_pretty(config).map_err(|e| TenderScoutError::config(e.to_string()))?;
    Ok(format!("{CONFIG_HEADER}{body}"))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TenderScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = render_config(&config)?;

    std::fs::write(&path, content).map_err(|e| TenderScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

//! Page capability: navigation plus DOM queries returning page-scoped handles.
//!
//! Handles are only valid for the document they were issued on. Navigating
//! away invalidates them; going back restores the previous document and with
//! it the handles issued there.

mod chromium;
mod dom;
mod http;

use std::time::Duration;

use regex::Regex;
use url::Url;

use tenderscout_shared::Result;

pub use chromium::ChromiumPage;
pub use http::HttpPage;

/// Opaque reference to an element of one loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    generation: u64,
    slot: usize,
}

impl ElementHandle {
    pub(crate) fn new(generation: u64, slot: usize) -> Self {
        Self { generation, slot }
    }

    /// Document generation this handle was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }
}

/// A single browser-tab-like page.
///
/// Implementations are driven strictly sequentially: one navigation or query
/// at a time. Every wait takes an explicit timeout.
#[allow(async_fn_in_trait)]
pub trait Page {
    /// Load `url` as a new document, waiting up to `timeout` for it to settle.
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()>;

    /// Return to the previous document in history.
    async fn go_back(&mut self, timeout: Duration) -> Result<()>;

    /// URL of the current document, if one is loaded.
    fn current_url(&self) -> Option<Url>;

    /// Wait until some element's text matches `pattern`.
    async fn wait_for_text(&mut self, pattern: &Regex, timeout: Duration) -> Result<()>;

    /// Wait until any of `selectors` matches an element.
    async fn wait_for_selector(&mut self, selectors: &[String], timeout: Duration) -> Result<()>;

    /// Idle for `duration`.
    async fn pause(&mut self, duration: Duration);

    /// Scroll the viewport to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Scroll the viewport to the top of the document.
    async fn scroll_to_top(&mut self) -> Result<()>;

    /// All elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Attribute value of an element.
    async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>>;

    /// Rendered text of an element and its descendants.
    async fn inner_text(&self, element: ElementHandle) -> Result<String>;

    /// Lowercase tag name of an element.
    async fn tag_name(&self, element: ElementHandle) -> Result<String>;

    /// Parent element, or `None` at the document root.
    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>>;

    /// Activate an element (follow a link) and wait for the resulting navigation.
    async fn click(&mut self, element: ElementHandle, timeout: Duration) -> Result<()>;

    /// Release everything the page holds.
    async fn close(&mut self);
}

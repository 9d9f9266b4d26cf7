//! Static HTTP page engine: `reqwest` for transport, `scraper` for the DOM.
//!
//! Runs no scripts. Scrolling is a no-op and waits check the fetched document
//! once, since it never changes after load. Suited to server-rendered portals
//! and to tests.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};
use url::Url;

use tenderscout_shared::{Result, TenderScoutError};

use super::dom::DocumentState;
use super::{ElementHandle, Page};

/// Whether a response with this `Content-Type` can be parsed as a page.
///
/// A missing header is given the benefit of the doubt.
pub(crate) fn is_markup(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

/// A page backed by plain HTTP fetches of server-rendered HTML.
pub struct HttpPage {
    client: Client,
    state: DocumentState,
}

impl HttpPage {
    /// Open a page that sends `user_agent` with every request.
    ///
    /// `headless` is accepted for parity with rendering engines; this engine
    /// never draws anything.
    pub fn launch(user_agent: &str, headless: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| {
                TenderScoutError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        info!(headless, engine = "http", "page opened");

        Ok(Self {
            client,
            state: DocumentState::default(),
        })
    }

    async fn fetch(&self, url: &Url) -> Result<(Url, String)> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| TenderScoutError::navigation(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TenderScoutError::navigation(format!("{url}: HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !is_markup(content_type.as_deref()) {
            return Err(TenderScoutError::navigation(format!(
                "{url}: not a page (content type {})",
                content_type.unwrap_or_default()
            )));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| TenderScoutError::navigation(format!("{url}: body read failed: {e}")))?;

        Ok((final_url, body))
    }
}

impl Page for HttpPage {
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        debug!(%url, "navigating");

        let (final_url, body) = tokio::time::timeout(timeout, self.fetch(url))
            .await
            .map_err(|_| {
                TenderScoutError::navigation(format!("{url}: timed out after {timeout:?}"))
            })??;

        self.state.push(final_url, &body);
        Ok(())
    }

    async fn go_back(&mut self, _timeout: Duration) -> Result<()> {
        self.state.pop()
    }

    fn current_url(&self) -> Option<Url> {
        self.state.current_url()
    }

    async fn wait_for_text(&mut self, pattern: &Regex, _timeout: Duration) -> Result<()> {
        if self.state.text_matches(pattern) {
            Ok(())
        } else {
            Err(TenderScoutError::navigation(format!(
                "no text matching {pattern} on the loaded page"
            )))
        }
    }

    async fn wait_for_selector(&mut self, selectors: &[String], _timeout: Duration) -> Result<()> {
        if self.state.any_selector_matches(selectors) {
            Ok(())
        } else {
            Err(TenderScoutError::navigation(format!(
                "none of {} selectors matched",
                selectors.len()
            )))
        }
    }

    async fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.state.query_all(selector)
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>> {
        self.state.attribute(element, name)
    }

    async fn inner_text(&self, element: ElementHandle) -> Result<String> {
        self.state.inner_text(element)
    }

    async fn tag_name(&self, element: ElementHandle) -> Result<String> {
        self.state.tag_name(element)
    }

    async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
        self.state.parent(element)
    }

    async fn click(&mut self, element: ElementHandle, timeout: Duration) -> Result<()> {
        let target = self.state.link_target(element)?;
        self.goto(&target, timeout).await
    }

    async fn close(&mut self) {
        self.state.clear();
        debug!("page closed");
    }
}

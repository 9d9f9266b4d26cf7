//! Listing-page load detection with ordered fallbacks.

use regex::Regex;
use tracing::{info, instrument, warn};
use url::Url;

use tenderscout_shared::{NavigationTimings, Result, TenderScoutError};

use crate::page::Page;

/// Which readiness signal the page satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSignal {
    /// Text matching the keyword vocabulary appeared.
    Keyword,
    /// One of the generic list/table/card selectors matched.
    Selector,
    /// Nothing matched; proceeded after the fallback delay.
    Delay,
}

/// Loads a listing page and waits until its content is likely rendered.
#[derive(Debug, Clone)]
pub struct Navigator {
    keyword_pattern: Option<Regex>,
    wait_selectors: Vec<String>,
    timings: NavigationTimings,
}

impl Navigator {
    pub fn new(keywords: &[String], wait_selectors: &[String], timings: NavigationTimings) -> Self {
        Self {
            keyword_pattern: keyword_pattern(keywords),
            wait_selectors: wait_selectors.to_vec(),
            timings,
        }
    }

    /// Load `url`, then wait for keyword text, then for a generic selector,
    /// then for a fixed delay, stopping at the first signal that fires.
    /// Finishes with a bottom/top scroll cycle for lazy-loaded content.
    ///
    /// Fails only when no document could be loaded at all.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn load<P: Page>(&self, page: &mut P, url: &Url) -> Result<LoadSignal> {
        info!("navigating to listing page");
        if let Err(e) = page.goto(url, self.timings.page_load).await {
            if page.current_url().is_none() {
                return Err(TenderScoutError::navigation(format!(
                    "could not reach listing page {url}: {e}"
                )));
            }
            warn!(error = %e, "page did not settle before timeout, continuing");
        }

        let signal = self.wait_for_content(page).await;
        info!(?signal, "listing page ready");

        self.scroll_cycle(page).await;
        Ok(signal)
    }

    async fn wait_for_content<P: Page>(&self, page: &mut P) -> LoadSignal {
        if let Some(pattern) = &self.keyword_pattern {
            match page.wait_for_text(pattern, self.timings.content_wait).await {
                Ok(()) => return LoadSignal::Keyword,
                Err(e) => {
                    warn!(error = %e, "could not find keywords on initial load, waiting for a generic selector")
                }
            }
        }

        match page
            .wait_for_selector(&self.wait_selectors, self.timings.content_wait)
            .await
        {
            Ok(()) => LoadSignal::Selector,
            Err(e) => {
                warn!(error = %e, "generic selectors not found, proceeding after a short delay");
                page.pause(self.timings.fallback_delay).await;
                LoadSignal::Delay
            }
        }
    }

    async fn scroll_cycle<P: Page>(&self, page: &mut P) {
        if let Err(e) = page.scroll_to_bottom().await {
            warn!(error = %e, "scroll to bottom failed");
        }
        page.pause(self.timings.scroll_bottom_pause).await;
        if let Err(e) = page.scroll_to_top().await {
            warn!(error = %e, "scroll to top failed");
        }
        page.pause(self.timings.scroll_top_pause).await;
    }
}

/// Case-insensitive alternation of the escaped keywords.
fn keyword_pattern(keywords: &[String]) -> Option<Regex> {
    let alternation = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    if alternation.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i)(?:{alternation})")).ok()
}

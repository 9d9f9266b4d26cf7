//! Candidate discovery: anchors on the listing page that plausibly lead to a
//! tender document, paired with the context text around them.

use tracing::{debug, info};
use url::Url;

use tenderscout_shared::{Result, TenderScoutError};

use crate::context::{ContainerStrategy, collapse_whitespace, resolve_context};
use crate::page::{ElementHandle, Page};

/// A link found on the listing page. Lives only as long as the run.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Absolute link target.
    pub href: Url,
    /// Visible link text.
    pub title: String,
    /// Normalized text of the surrounding entry (falls back to `title`).
    pub context_text: String,
    /// Handle into the listing page the link was found on.
    pub element: ElementHandle,
}

/// href/text rules deciding what counts as a document and what as a candidate.
#[derive(Debug, Clone)]
pub struct LinkHeuristics {
    /// `.pdf`-style suffix, lowercase, with the leading dot.
    marker: String,
    action_words: Vec<String>,
}

impl LinkHeuristics {
    pub fn new(document_extension: &str, action_words: &[String]) -> Self {
        Self {
            marker: format!(".{}", document_extension.trim_start_matches('.').to_lowercase()),
            action_words: action_words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Empty, bare `#` and `javascript:` hrefs lead nowhere.
    ///
    /// Hash routes such as `#/tender/12` are real links on single-page portals.
    pub fn is_placeholder(href: &str) -> bool {
        let href = href.trim();
        href.is_empty() || href == "#" || href.to_ascii_lowercase().starts_with("javascript:")
    }

    /// Keep a raw link if its href carries the document marker or its text an action word.
    pub fn is_plausible(&self, href: &str, text: &str) -> bool {
        if href.to_lowercase().contains(&self.marker) {
            return true;
        }
        let text = text.to_lowercase();
        self.action_words.iter().any(|w| text.contains(w.as_str()))
    }

    /// Whether a resolved URL names a document resource: its path, or the whole
    /// URL without the fragment, ends in the marker.
    ///
    /// The second form covers download scripts like `/download.php?file=nit42.pdf`.
    pub fn is_document_url(&self, url: &Url) -> bool {
        if url.path().to_lowercase().ends_with(&self.marker) {
            return true;
        }
        let mut bare = url.clone();
        bare.set_fragment(None);
        bare.as_str().to_lowercase().ends_with(&self.marker)
    }
}

/// Lazily walks the listing page's anchors, yielding at most `limit` accepted candidates.
///
/// The anchor list is captured once by [`CandidateExtractor::scan`]; a new scan
/// re-queries the live page.
pub struct CandidateExtractor {
    base: Url,
    links: Vec<ElementHandle>,
    cursor: usize,
    accepted: usize,
    limit: usize,
    heuristics: LinkHeuristics,
}

impl CandidateExtractor {
    /// Capture the anchors currently on `page`.
    pub async fn scan<P: Page>(page: &P, heuristics: LinkHeuristics, limit: usize) -> Result<Self> {
        let base = page
            .current_url()
            .ok_or_else(|| TenderScoutError::dom("no listing page loaded"))?;
        let links = page.query_all("a[href]").await?;
        info!(links = links.len(), %base, "found links on listing page");

        Ok(Self {
            base,
            links,
            cursor: 0,
            accepted: 0,
            limit,
            heuristics,
        })
    }

    /// Number of anchors looked at so far.
    pub fn scanned(&self) -> usize {
        self.cursor
    }

    /// Total anchors captured by the scan.
    pub fn total_links(&self) -> usize {
        self.links.len()
    }

    /// Whether the bound has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.accepted >= self.limit || self.cursor >= self.links.len()
    }

    /// Next plausible candidate that `accept` keeps, or `None` once the page or the bound runs out.
    ///
    /// Rejected candidates do not count toward the bound.
    pub async fn next_candidate<P, S, F>(
        &mut self,
        page: &P,
        strategy: &S,
        mut accept: F,
    ) -> Option<Candidate>
    where
        P: Page,
        S: ContainerStrategy,
        F: FnMut(&Candidate) -> bool,
    {
        while !self.is_exhausted() {
            let element = self.links[self.cursor];
            self.cursor += 1;

            let candidate = match self.inspect(page, strategy, element).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    debug!(error = %e, "error processing link");
                    continue;
                }
            };

            if accept(&candidate) {
                self.accepted += 1;
                return Some(candidate);
            }
        }
        None
    }

    async fn inspect<P, S>(
        &self,
        page: &P,
        strategy: &S,
        element: ElementHandle,
    ) -> Result<Option<Candidate>>
    where
        P: Page,
        S: ContainerStrategy,
    {
        let Some(href) = page.attribute(element, "href").await? else {
            return Ok(None);
        };
        if LinkHeuristics::is_placeholder(&href) {
            return Ok(None);
        }

        let title = collapse_whitespace(&page.inner_text(element).await?);
        if !self.heuristics.is_plausible(&href, &title) {
            return Ok(None);
        }

        let Ok(absolute) = self.base.join(href.trim()) else {
            debug!(%href, "unresolvable href");
            return Ok(None);
        };

        let mut context_text = resolve_context(page, strategy, element).await;
        if context_text.is_empty() {
            context_text = title.clone();
        }

        Ok(Some(Candidate {
            href: absolute,
            title,
            context_text,
            element,
        }))
    }
}

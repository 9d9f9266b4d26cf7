//! Turns accepted candidates into concrete document URLs.
//!
//! A candidate whose href already names a document resolves directly. Anything
//! else is a detail page: open it, take the first document link, resolve that
//! against the detail page's URL, then go back to the listing page.

use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use tenderscout_shared::{Result, TenderScoutError};

use crate::candidates::{Candidate, LinkHeuristics};
use crate::page::Page;

/// A candidate paired with the document it leads to.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub candidate: Candidate,
    pub document_url: Url,
}

/// How a candidate reaches its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Direct,
    Indirect,
}

/// Result of resolving one candidate.
#[derive(Debug)]
pub struct ResolveOutcome {
    /// The document found, if any.
    pub document: Option<ResolvedDocument>,
    /// The page is no longer on the listing page; call [`DocumentResolver::recover`].
    pub needs_recovery: bool,
}

impl ResolveOutcome {
    fn settled(document: Option<ResolvedDocument>) -> Self {
        Self {
            document,
            needs_recovery: false,
        }
    }
}

/// Resolves candidates against one listing page.
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    start_url: Url,
    heuristics: LinkHeuristics,
    detail_timeout: Duration,
    reload_timeout: Duration,
}

impl DocumentResolver {
    pub fn new(
        start_url: Url,
        heuristics: LinkHeuristics,
        detail_timeout: Duration,
        reload_timeout: Duration,
    ) -> Self {
        Self {
            start_url,
            heuristics,
            detail_timeout,
            reload_timeout,
        }
    }

    pub fn classify(&self, candidate: &Candidate) -> ResolutionKind {
        if self.heuristics.is_document_url(&candidate.href) {
            ResolutionKind::Direct
        } else {
            ResolutionKind::Indirect
        }
    }

    /// Resolve one candidate. Navigation failures are reported through
    /// [`ResolveOutcome::needs_recovery`], never returned.
    #[instrument(skip_all, fields(href = %candidate.href))]
    pub async fn resolve<P: Page>(&self, page: &mut P, candidate: Candidate) -> ResolveOutcome {
        if self.classify(&candidate) == ResolutionKind::Direct {
            let document_url = candidate.href.clone();
            return ResolveOutcome::settled(Some(ResolvedDocument {
                candidate,
                document_url,
            }));
        }

        info!("navigating to detail page");
        let found = match self.open_detail(page, &candidate).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "failed to process detail page");
                return ResolveOutcome {
                    document: None,
                    needs_recovery: true,
                };
            }
        };

        let document = match found {
            Some(document_url) => Some(ResolvedDocument {
                candidate,
                document_url,
            }),
            None => {
                warn!(
                    detail_url = %page.current_url().map(|u| u.to_string()).unwrap_or_default(),
                    "no document link found on detail page"
                );
                None
            }
        };

        if let Err(e) = page.go_back(self.detail_timeout).await {
            warn!(error = %e, "failed to return to listing page");
            return ResolveOutcome {
                document,
                needs_recovery: true,
            };
        }

        ResolveOutcome::settled(document)
    }

    /// Reload the listing page after a failed navigation.
    ///
    /// Handles issued before the reload are stale afterwards.
    pub async fn recover<P: Page>(&self, page: &mut P) -> Result<()> {
        warn!(start_url = %self.start_url, "reloading listing page");
        page.goto(&self.start_url, self.reload_timeout).await
    }

    /// Follow the candidate to its detail page and find the first document link there.
    async fn open_detail<P: Page>(&self, page: &mut P, candidate: &Candidate) -> Result<Option<Url>> {
        match page.click(candidate.element, self.detail_timeout).await {
            Ok(()) => {}
            Err(TenderScoutError::StaleHandle { .. }) => {
                page.goto(&candidate.href, self.detail_timeout).await?;
            }
            Err(e) => return Err(e),
        }

        let detail_url = page
            .current_url()
            .ok_or_else(|| TenderScoutError::navigation("detail page did not load"))?;

        for link in page.query_all("a[href]").await? {
            let Some(href) = page.attribute(link, "href").await? else {
                continue;
            };
            if LinkHeuristics::is_placeholder(&href) {
                continue;
            }
            let Ok(absolute) = detail_url.join(href.trim()) else {
                continue;
            };
            if self.heuristics.is_document_url(&absolute) {
                return Ok(Some(absolute));
            }
        }
        Ok(None)
    }
}

//! End-to-end crawl run: listing page → candidates → filter → resolve →
//! download → manifest.
//!
//! Everything runs sequentially on one page. Only two failures end a run with
//! an error: the listing page cannot be reached, or the manifest cannot be
//! written. Everything else is logged, counted, and skipped.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use tenderscout_crawler::{
    AncestorWalk, Candidate, CandidateExtractor, ChromiumPage, DocumentResolver, Downloader,
    HttpPage, LinkHeuristics, LoadSignal, Navigator, Page, RelevanceFilter, Verdict,
};
use tenderscout_shared::{ManifestEntry, PageEngine, Result, RunConfig};

use crate::manifest::{ManifestBuilder, write_manifest};

/// Counters describing what happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Anchors found on the listing page.
    pub links_found: usize,
    /// Anchors inspected before the candidate bound was hit.
    pub links_scanned: usize,
    /// Candidates that passed the relevance filter.
    pub accepted: usize,
    pub rejected_no_keyword: usize,
    pub rejected_not_recent: usize,
    /// Detail pages that held no document link.
    pub detail_pages_without_document: usize,
    /// Detail or back navigations that failed.
    pub navigation_failures: usize,
    /// Documents whose download exhausted its retries.
    pub download_failures: usize,
    /// Accepted candidates left unprocessed after an abort.
    pub skipped_after_abort: usize,
    /// The listing page was lost and could not be reloaded.
    pub aborted: bool,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct CrawlReport {
    pub run_id: Uuid,
    /// Deduplicated entries, as persisted.
    pub entries: Vec<ManifestEntry>,
    pub manifest_path: PathBuf,
    pub load_signal: LoadSignal,
    pub stats: RunStats,
    pub elapsed: Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a candidate passes the relevance filter.
    fn candidate_accepted(&self, title: &str, current: usize, max: usize);
    /// Called when a document lands on disk.
    fn document_saved(&self, path: &std::path::Path, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &CrawlReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn candidate_accepted(&self, _title: &str, _current: usize, _max: usize) {}
    fn document_saved(&self, _path: &std::path::Path, _current: usize, _total: usize) {}
    fn done(&self, _report: &CrawlReport) {}
}

/// Run a crawl with the configured page engine and today's local date.
///
/// Chromium is the default engine. The static HTTP engine skips script
/// execution and needs no browser installed.
pub async fn run_crawl(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<CrawlReport> {
    config.validate()?;
    let today = Local::now().date_naive();
    match config.engine {
        PageEngine::Chromium => {
            let page = ChromiumPage::launch(
                &config.user_agent,
                config.headless,
                config.browser_executable.as_deref(),
            )
            .await?;
            run_crawl_with(config, page, today, progress).await
        }
        PageEngine::Http => {
            let page = HttpPage::launch(&config.user_agent, config.headless)?;
            run_crawl_with(config, page, today, progress).await
        }
    }
}

/// Run a crawl on `page`, judging recency relative to `today`.
///
/// The page is closed on every exit path.
#[instrument(skip_all, fields(start_url = %config.start_url))]
pub async fn run_crawl_with<P: Page>(
    config: &RunConfig,
    mut page: P,
    today: NaiveDate,
    progress: &dyn ProgressReporter,
) -> Result<CrawlReport> {
    let start = Instant::now();
    let run_id = Uuid::now_v7();

    if let Err(e) = config.validate() {
        page.close().await;
        return Err(e);
    }

    info!(
        %run_id,
        max_candidates = config.max_candidates,
        recency_months = config.recency_months,
        download_dir = %config.download_dir.display(),
        "starting crawl run"
    );

    let outcome = crawl_listing(config, &mut page, today, progress).await;
    page.close().await;
    let (builder, stats, load_signal) = outcome?;

    progress.phase("Writing manifest");
    let entries = builder.finish();
    write_manifest(&config.manifest_path, &entries)?;

    let report = CrawlReport {
        run_id,
        entries,
        manifest_path: config.manifest_path.clone(),
        load_signal,
        stats,
        elapsed: start.elapsed(),
    };

    info!(
        %run_id,
        documents = report.entries.len(),
        accepted = report.stats.accepted,
        download_failures = report.stats.download_failures,
        aborted = report.stats.aborted,
        duration_ms = report.elapsed.as_millis(),
        "crawl run completed"
    );

    progress.done(&report);
    Ok(report)
}

async fn crawl_listing<P: Page>(
    config: &RunConfig,
    page: &mut P,
    today: NaiveDate,
    progress: &dyn ProgressReporter,
) -> Result<(ManifestBuilder, RunStats, LoadSignal)> {
    let mut stats = RunStats::default();
    let downloader = Downloader::new(
        &config.user_agent,
        config.retry.clone(),
        &config.document_extension,
    )?;

    progress.phase("Loading listing page");
    let navigator = Navigator::new(
        &config.keywords,
        &config.wait_selectors,
        config.timings.clone(),
    );
    let load_signal = navigator.load(page, &config.start_url).await?;

    progress.phase("Discovering candidates");
    let heuristics = LinkHeuristics::new(&config.document_extension, &config.action_words);
    let candidates = discover(config, page, heuristics.clone(), today, &mut stats, progress).await;
    info!(
        candidates = candidates.len(),
        "found relevant candidates after filtering"
    );

    progress.phase("Resolving and downloading documents");
    let resolver = DocumentResolver::new(
        config.start_url.clone(),
        heuristics,
        config.timings.detail,
        config.timings.page_load,
    );
    let mut builder = ManifestBuilder::new();
    let total = candidates.len();

    for (index, candidate) in candidates.into_iter().enumerate() {
        let title = candidate.title.clone();
        let context_text = candidate.context_text.clone();
        let outcome = resolver.resolve(page, candidate).await;

        match outcome.document {
            Some(document) => {
                match downloader
                    .fetch(&document.document_url, &config.download_dir)
                    .await
                {
                    Ok(local_path) => {
                        builder.push(ManifestEntry {
                            title,
                            document_url: document.document_url.to_string(),
                            local_path: local_path.clone(),
                            context_text,
                        });
                        progress.document_saved(&local_path, builder.len(), total);
                    }
                    Err(e) => {
                        error!(url = %document.document_url, error = %e, "skipping document");
                        stats.download_failures += 1;
                    }
                }
            }
            None if !outcome.needs_recovery => stats.detail_pages_without_document += 1,
            None => {}
        }

        if outcome.needs_recovery {
            stats.navigation_failures += 1;
            if let Err(e) = resolver.recover(page).await {
                error!(error = %e, "failed to return to start URL, aborting");
                stats.aborted = true;
                stats.skipped_after_abort = total - index - 1;
                break;
            }
        }
    }

    Ok((builder, stats, load_signal))
}

/// Collect up to `max_candidates` relevant candidates from the loaded listing page.
async fn discover<P: Page>(
    config: &RunConfig,
    page: &P,
    heuristics: LinkHeuristics,
    today: NaiveDate,
    stats: &mut RunStats,
    progress: &dyn ProgressReporter,
) -> Vec<Candidate> {
    let mut extractor =
        match CandidateExtractor::scan(page, heuristics, config.max_candidates).await {
            Ok(extractor) => extractor,
            Err(e) => {
                warn!(error = %e, "could not enumerate links on listing page");
                return Vec::new();
            }
        };
    stats.links_found = extractor.total_links();

    let filter = RelevanceFilter::new(&config.keywords, config.recency_months, today);
    let strategy = AncestorWalk::new(&config.container_tags, &config.container_class_hints);
    let mut candidates = Vec::new();

    loop {
        let (mut no_keyword, mut not_recent) = (0, 0);
        let next = extractor
            .next_candidate(page, &strategy, |c| match filter.evaluate(&c.context_text) {
                Verdict::Accepted => true,
                Verdict::NoKeyword => {
                    debug!(href = %c.href, "rejected: no keyword");
                    no_keyword += 1;
                    false
                }
                Verdict::NotRecent => {
                    debug!(href = %c.href, "rejected: no recent date");
                    not_recent += 1;
                    false
                }
            })
            .await;
        stats.rejected_no_keyword += no_keyword;
        stats.rejected_not_recent += not_recent;

        let Some(candidate) = next else { break };
        progress.candidate_accepted(&candidate.title, candidates.len() + 1, config.max_candidates);
        candidates.push(candidate);
    }

    stats.links_scanned = extractor.scanned();
    stats.accepted = candidates.len();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as Days;
    use tenderscout_crawler::ElementHandle;
    use tenderscout_shared::{AppConfig, NavigationTimings, TenderScoutError};
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::manifest::read_manifest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn days_ago(n: i64) -> String {
        (today() - Days::days(n)).format("%d/%m/%Y").to_string()
    }

    fn config(server: &MockServer, label: &str) -> (RunConfig, PathBuf) {
        let root = std::env::temp_dir().join(format!("ts-run-{label}-{}", Uuid::now_v7()));
        let start = Url::parse(&format!("{}/tenders", server.uri())).unwrap();
        let mut config = RunConfig::from_app(&AppConfig::default(), start);
        config.download_dir = root.join("raw");
        config.manifest_path = root.join("manifest.json");
        config.timings = NavigationTimings::immediate();
        config.retry.base_delay = std::time::Duration::from_millis(1);
        (config, root)
    }

    async fn serve(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn serve_pdf(server: &MockServer, at: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("%PDF {at}").into_bytes()))
            .expect(1)
            .mount(server)
            .await;
    }

    fn row(text: &str, href: &str, link: &str) -> String {
        format!(r#"<tr class="tender-row"><td>{text}</td><td>Department of Public Works</td><td><a href="{href}">{link}</a></td></tr>"#)
    }

    fn listing(rows: &[String]) -> String {
        format!("<html><body><table>{}</table></body></html>", rows.concat())
    }

    #[tokio::test]
    async fn end_to_end_recent_direct_and_detail_documents() {
        let server = MockServer::start().await;
        let rows = [
            row(
                &format!("Tender Notice for supply of lab chairs, published {}", days_ago(10)),
                "/docs/a.pdf",
                "Download",
            ),
            row(
                &format!("Tender Notice for supply of old desks, published {}", days_ago(200)),
                "/docs/b.pdf",
                "Download",
            ),
            row(
                &format!("Tender Notice for installation of CCTV, published {}", days_ago(5)),
                "/notice/c",
                "Details",
            ),
        ];
        serve(&server, "/tenders", listing(&rows)).await;
        serve(
            &server,
            "/notice/c",
            r#"<html><body><a href="files/c.pdf">NIT</a></body></html>"#.to_string(),
        )
        .await;
        serve_pdf(&server, "/docs/a.pdf").await;
        serve_pdf(&server, "/notice/files/c.pdf").await;
        Mock::given(path("/docs/b.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (config, root) = config(&server, "e2e");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        let urls: Vec<_> = report.entries.iter().map(|e| e.document_url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/docs/a.pdf", server.uri()),
                format!("{}/notice/files/c.pdf", server.uri()),
            ]
        );
        assert_eq!(report.load_signal, LoadSignal::Keyword);
        assert_eq!(report.stats.accepted, 2);
        assert_eq!(report.stats.rejected_not_recent, 1);
        assert!(!report.stats.aborted);

        for entry in &report.entries {
            assert!(entry.local_path.starts_with(&config.download_dir));
            assert!(entry.local_path.exists());
            assert!(entry.context_text.contains("Tender Notice"));
        }

        let persisted = read_manifest(&config.manifest_path).unwrap();
        assert_eq!(persisted, report.entries);

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn duplicate_documents_appear_once() {
        let server = MockServer::start().await;
        let fresh = days_ago(3);
        let rows = [
            row(&format!("Tender 7, corrigendum issued {fresh}"), "/docs/t7.pdf", "View"),
            row(&format!("Tender 7, first notice dated {fresh}"), "/docs/t7.pdf", "View"),
        ];
        serve(&server, "/tenders", listing(&rows)).await;
        serve_pdf(&server, "/docs/t7.pdf").await;

        let (config, root) = config(&server, "dedup");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.stats.accepted, 2);
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].context_text.contains("corrigendum"));

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn max_candidates_bounds_accepted_documents() {
        let server = MockServer::start().await;
        let fresh = days_ago(1);
        let rows: Vec<_> = (1..=4)
            .map(|i| row(&format!("Tender {i} notice, published on {fresh}"), &format!("/docs/{i}.pdf"), "View"))
            .collect();
        serve(&server, "/tenders", listing(&rows)).await;
        serve_pdf(&server, "/docs/1.pdf").await;
        serve_pdf(&server, "/docs/2.pdf").await;

        let (mut config, root) = config(&server, "bound");
        config.max_candidates = 2;
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.stats.links_found, 4);
        assert_eq!(report.stats.links_scanned, 2);

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn failed_download_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        let fresh = days_ago(2);
        let rows = [
            row(&format!("Tender A notice, published {fresh}"), "/docs/broken.pdf", "View"),
            row(&format!("Tender B notice, published {fresh}"), "/docs/ok.pdf", "View"),
        ];
        serve(&server, "/tenders", listing(&rows)).await;
        Mock::given(path("/docs/broken.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        serve_pdf(&server, "/docs/ok.pdf").await;

        let (config, root) = config(&server, "dlfail");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.stats.download_failures, 1);
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].document_url.ends_with("/docs/ok.pdf"));

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn lost_listing_page_aborts_with_partial_results() {
        let server = MockServer::start().await;
        let fresh = days_ago(2);
        let rows = [
            row(&format!("Tender A notice, published {fresh}"), "/docs/a.pdf", "View"),
            row(&format!("Tender B notice, published {fresh}"), "/notice/b", "Details"),
            row(&format!("Tender C notice, published {fresh}"), "/notice/c", "Details"),
        ];
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&rows)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(path("/notice/b"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(path("/notice/c"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        serve_pdf(&server, "/docs/a.pdf").await;

        let (config, root) = config(&server, "abort");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert!(report.stats.aborted);
        assert_eq!(report.stats.navigation_failures, 1);
        assert_eq!(report.stats.skipped_after_abort, 1);
        assert_eq!(report.entries.len(), 1);
        assert!(config.manifest_path.exists());

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    /// Static page whose first `go_back` fails, as when a portal breaks history.
    struct BrokenBack {
        inner: HttpPage,
        failures_left: usize,
    }

    impl BrokenBack {
        fn new() -> Self {
            Self {
                inner: HttpPage::launch("test", true).unwrap(),
                failures_left: 1,
            }
        }
    }

    impl Page for BrokenBack {
        async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()> {
            self.inner.goto(url, timeout).await
        }

        async fn go_back(&mut self, timeout: Duration) -> Result<()> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(TenderScoutError::navigation("history entry is gone"));
            }
            self.inner.go_back(timeout).await
        }

        fn current_url(&self) -> Option<Url> {
            self.inner.current_url()
        }

        async fn wait_for_text(&mut self, pattern: &regex::Regex, timeout: Duration) -> Result<()> {
            self.inner.wait_for_text(pattern, timeout).await
        }

        async fn wait_for_selector(&mut self, selectors: &[String], timeout: Duration) -> Result<()> {
            self.inner.wait_for_selector(selectors, timeout).await
        }

        async fn pause(&mut self, duration: Duration) {
            self.inner.pause(duration).await
        }

        async fn scroll_to_bottom(&mut self) -> Result<()> {
            self.inner.scroll_to_bottom().await
        }

        async fn scroll_to_top(&mut self) -> Result<()> {
            self.inner.scroll_to_top().await
        }

        async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
            self.inner.query_all(selector).await
        }

        async fn attribute(&self, element: ElementHandle, name: &str) -> Result<Option<String>> {
            self.inner.attribute(element, name).await
        }

        async fn inner_text(&self, element: ElementHandle) -> Result<String> {
            self.inner.inner_text(element).await
        }

        async fn tag_name(&self, element: ElementHandle) -> Result<String> {
            self.inner.tag_name(element).await
        }

        async fn parent(&self, element: ElementHandle) -> Result<Option<ElementHandle>> {
            self.inner.parent(element).await
        }

        async fn click(&mut self, element: ElementHandle, timeout: Duration) -> Result<()> {
            self.inner.click(element, timeout).await
        }

        async fn close(&mut self) {
            self.inner.close().await
        }
    }

    fn detail_with_document(file: &str) -> String {
        format!(r#"<html><body><a href="files/{file}">NIT</a></body></html>"#)
    }

    #[tokio::test]
    async fn failed_back_navigation_keeps_document_and_reloads_listing() {
        let server = MockServer::start().await;
        let fresh = days_ago(2);
        let rows = [
            row(&format!("Tender B notice, published {fresh}"), "/notice/b", "Details"),
            row(&format!("Tender C notice, published {fresh}"), "/notice/c", "Details"),
        ];
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&rows)))
            .expect(2)
            .mount(&server)
            .await;
        serve(&server, "/notice/b", detail_with_document("b.pdf")).await;
        serve(&server, "/notice/c", detail_with_document("c.pdf")).await;
        serve_pdf(&server, "/notice/files/b.pdf").await;
        serve_pdf(&server, "/notice/files/c.pdf").await;

        let (config, root) = config(&server, "backfail");
        let report = run_crawl_with(&config, BrokenBack::new(), today(), &SilentProgress)
            .await
            .unwrap();

        assert!(!report.stats.aborted);
        assert_eq!(report.stats.navigation_failures, 1);
        let urls: Vec<_> = report.entries.iter().map(|e| e.document_url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}/notice/files/b.pdf", server.uri()),
                format!("{}/notice/files/c.pdf", server.uri()),
            ]
        );
        assert_eq!(read_manifest(&config.manifest_path).unwrap(), report.entries);

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn failed_back_navigation_and_reload_aborts_after_saving_document() {
        let server = MockServer::start().await;
        let fresh = days_ago(2);
        let rows = [
            row(&format!("Tender B notice, published {fresh}"), "/notice/b", "Details"),
            row(&format!("Tender C notice, published {fresh}"), "/notice/c", "Details"),
        ];
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&rows)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        serve(&server, "/notice/b", detail_with_document("b.pdf")).await;
        Mock::given(path("/notice/c"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        serve_pdf(&server, "/notice/files/b.pdf").await;

        let (config, root) = config(&server, "backfail-abort");
        let report = run_crawl_with(&config, BrokenBack::new(), today(), &SilentProgress)
            .await
            .unwrap();

        assert!(report.stats.aborted);
        assert_eq!(report.stats.navigation_failures, 1);
        assert_eq!(report.stats.skipped_after_abort, 1);
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].document_url.ends_with("/notice/files/b.pdf"));
        assert_eq!(read_manifest(&config.manifest_path).unwrap().len(), 1);

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn download_script_links_are_fetched_directly() {
        let server = MockServer::start().await;
        let rows = [row(
            &format!("Tender Notice for rain gauges, published {}", days_ago(4)),
            "/download.php?file=nit42.pdf",
            "Download",
        )];
        serve(&server, "/tenders", listing(&rows)).await;
        serve_pdf(&server, "/download.php").await;

        let (config, root) = config(&server, "script-link");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.stats.navigation_failures, 0);
        assert_eq!(
            report.entries[0].document_url,
            format!("{}/download.php?file=nit42.pdf", server.uri())
        );
        assert_eq!(
            report.entries[0].local_path,
            config.download_dir.join("nit42.pdf")
        );

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn chromium_engine_crawls_script_rendered_listing() {
        let server = MockServer::start().await;
        let rows = listing(&[row(
            &format!("Tender Notice for evaporimeters, published {}", days_ago(6)),
            "/docs/evap.pdf",
            "Download",
        )]);
        let page_html = format!(
            r#"<html><body><div id="root"></div><script>
                setTimeout(function () {{ document.getElementById('root').innerHTML = {rows:?}; }}, 300);
            </script></body></html>"#
        );
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(page_html, "text/html"))
            .mount(&server)
            .await;
        serve_pdf(&server, "/docs/evap.pdf").await;

        let (mut config, root) = config(&server, "chromium");
        config.engine = PageEngine::Chromium;
        config.timings.page_load = Duration::from_secs(10);
        config.timings.content_wait = Duration::from_secs(5);
        let report = run_crawl(&config, &SilentProgress).await.unwrap();

        assert_eq!(report.load_signal, LoadSignal::Keyword);
        assert_eq!(report.entries.len(), 1);
        assert!(report.entries[0].local_path.exists());

        server.verify().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn unreachable_listing_page_fails_without_manifest() {
        let server = MockServer::start().await;
        Mock::given(path("/tenders"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (config, root) = config(&server, "unreachable");
        let page = HttpPage::launch("test", true).unwrap();
        let err = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, TenderScoutError::Navigation(_)));
        assert!(!config.manifest_path.exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn page_without_candidates_writes_empty_manifest() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/tenders",
            "<html><body><p>No open tenders at the moment.</p></body></html>".to_string(),
        )
        .await;

        let (config, root) = config(&server, "empty");
        let page = HttpPage::launch("test", true).unwrap();
        let report = run_crawl_with(&config, page, today(), &SilentProgress)
            .await
            .unwrap();

        assert!(report.entries.is_empty());
        assert_eq!(read_manifest(&config.manifest_path).unwrap().len(), 0);
        let _ = std::fs::remove_dir_all(&root);
    }
}

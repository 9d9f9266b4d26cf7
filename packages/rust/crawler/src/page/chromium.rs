//! Chromium page engine over the DevTools protocol (`chromiumoxide`).
//!
//! The browser runs the page's scripts. After every navigation, successful wait
//! or scroll the rendered DOM is read back and snapshotted, and queries run
//! against that snapshot. Handles therefore follow the same generation rules
//! as the static engine. Re-reading the DOM in place issues a new generation.

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page as Tab;
use futures::StreamExt;
use regex::Regex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use tenderscout_shared::{Result, TenderScoutError};

use super::dom::DocumentState;
use super::{ElementHandle, Page};

/// How often waits re-check the live DOM.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";
const SCROLL_BOTTOM_JS: &str =
    "window.scrollTo(0, document.body ? document.body.scrollHeight : 0); true";
const SCROLL_TOP_JS: &str = "window.scrollTo(0, 0); true";

/// A single browser tab in a dedicated Chromium process.
pub struct ChromiumPage {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    tab: Option<Tab>,
    state: DocumentState,
}

impl ChromiumPage {
    /// Launch Chromium and open one blank tab.
    ///
    /// `executable` overrides auto-detection of the browser binary.
    pub async fn launch(user_agent: &str, headless: bool, executable: Option<&Path>) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(1366, 900)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={user_agent}"));
        if !headless {
            builder = builder.with_head();
        }
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| TenderScoutError::Browser(format!("invalid browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| TenderScoutError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        let tab = match browser.new_page("about:blank").await {
            Ok(tab) => tab,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(TenderScoutError::Browser(format!("failed to open a tab: {e}")));
            }
        };

        info!(headless, engine = "chromium", "page opened");

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            tab: Some(tab),
            state: DocumentState::default(),
        })
    }

    fn tab(&self) -> Result<&Tab> {
        self.tab
            .as_ref()
            .ok_or_else(|| TenderScoutError::Browser("page already closed".into()))
    }

    /// Navigate the live tab, bounded by `timeout`.
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        tokio::time::timeout(timeout, tab.goto(url.as_str()))
            .await
            .map_err(|_| TenderScoutError::navigation(format!("{url}: timed out after {timeout:?}")))?
            .map_err(|e| TenderScoutError::navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    /// Serialized rendered DOM and the tab's URL, falling back to `expected`.
    async fn read_dom(&self, expected: &Url) -> Result<(Url, String)> {
        let tab = self.tab()?;
        let html = tab
            .content()
            .await
            .map_err(|e| TenderScoutError::dom(format!("could not read rendered DOM: {e}")))?;
        let url = tab
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(|| expected.clone());
        Ok((url, html))
    }

    /// Re-read the current document after the live DOM may have changed.
    async fn resnapshot(&mut self) -> Result<()> {
        let Some(expected) = self.state.current_url() else {
            return Ok(());
        };
        let (url, html) = self.read_dom(&expected).await?;
        self.state.refresh(url, &html);
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        self.tab()?
            .evaluate(BODY_TEXT_JS)
            .await
            .map_err(|e| TenderScoutError::dom(format!("could not read page text: {e}")))?
            .into_value::<String>()
            .map_err(|e| TenderScoutError::dom(format!("unexpected page text value: {e}")))
    }

    async fn any_selector_present(&self, selectors: &[String]) -> Result<bool> {
        let tab = self.tab()?;
        for selector in selectors {
            if tab.find_element(selector.as_str()).await.is_ok() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn run_script(&self, script: &str) -> Result<()> {
        self.tab()?
            .evaluate(script)
            .await
            .map_err(|e| TenderScoutError::dom(format!("script failed: {e}")))?;
        Ok(())
    }
}

impl Page for ChromiumPage {
    async fn goto(&mut self, url: &Url, timeout: Duration) -> Result<()> {
        debug!(%url, "navigating");
        self.navigate(url, timeout).await?;
        let (final_url, html) = self.read_dom(url).await?;
        self.state.push(final_url, &html);
        Ok(())
    }

    /// Re-opens the previous URL in the tab and restores the snapshot taken
    /// there, so handles issued on it are usable again.
    async fn go_back(&mut self, timeout: Duration) -> Result<()> {
        let previous = self
            .state
            .previous()
            .map(|doc| doc.url().clone())
            .ok_or_else(|| TenderScoutError::navigation("no previous page in history"))?;
        self.navigate(&previous, timeout).await?;
        self.state.pop()
    }

    fn current_url(&self) -> Option<Url> {
        self.state.current_url()
    }

    async fn wait_for_text(&mut self, pattern: &Regex, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            match self.body_text().await {
                Ok(text) if pattern.is_match(&text) => {
                    debug!(elapsed_ms = started.elapsed().as_millis(), "keyword text rendered");
                    return self.resnapshot().await;
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "text poll failed, retrying"),
            }
            if started.elapsed() >= timeout {
                return Err(TenderScoutError::navigation(format!(
                    "no text matching {pattern} after {timeout:?}"
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(&mut self, selectors: &[String], timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.any_selector_present(selectors).await? {
                debug!(elapsed_ms = started.elapsed().as_millis(), "content selector rendered");
                return self.resnapshot().await;
            }
            if started.elapsed() >= timeout {
                return Err(TenderScoutError::navigation(format!(
                    "none of {} selectors matched after {timeout:?}",
                    selectors.len()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.run_script(SCROLL_BOTTOM_JS).await?;
        self.resnapshot().await
    }

    async fn scroll_to_top(&mut self) -> Result<()> {
        self.run_script(SCROLL_TOP_JS).await?;
        self.resnapshot().await
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
        if let Some(tab) = self.tab.take() {
            if let Err(e) = tab.close().await {
                debug!(error = %e, "tab close failed");
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "browser close failed");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "waiting for browser exit failed");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("browser closed");
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCRIPTED_LISTING: &str = r#"<html><body><div id="root">Loading</div>
        <script>
          setTimeout(function () {
            document.getElementById('root').innerHTML =
              '<table class="tender-list"><tr><td>Tender notice for rain gauges</td>' +
              '<td><a href="/docs/rg.pdf">Download</a></td></tr></table>';
          }, 300);
        </script>
    </body></html>"#;

    async fn launch() -> ChromiumPage {
        ChromiumPage::launch("test", true, None)
            .await
            .expect("Chromium must be installed for this test")
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn waits_see_script_rendered_content() {
        let server = MockServer::start().await;
        Mock::given(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SCRIPTED_LISTING, "text/html"))
            .mount(&server)
            .await;

        let mut page = launch().await;
        let url = Url::parse(&server.uri()).unwrap();
        page.goto(&url, Duration::from_secs(10)).await.unwrap();

        let selectors = vec!["table.tender-list".to_string()];
        page.wait_for_selector(&selectors, Duration::from_secs(5))
            .await
            .unwrap();
        let keyword = Regex::new("(?i)tender notice").unwrap();
        page.wait_for_text(&keyword, Duration::from_secs(5)).await.unwrap();
        page.scroll_to_bottom().await.unwrap();
        page.scroll_to_top().await.unwrap();

        let links = page.query_all("a[href]").await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(
            page.attribute(links[0], "href").await.unwrap().as_deref(),
            Some("/docs/rg.pdf")
        );

        page.close().await;
        assert!(page.current_url().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn selector_wait_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html><body></body></html>", "text/html"))
            .mount(&server)
            .await;

        let mut page = launch().await;
        page.goto(&Url::parse(&server.uri()).unwrap(), Duration::from_secs(10))
            .await
            .unwrap();

        let started = Instant::now();
        let selectors = vec![".tender-card".to_string()];
        let err = page
            .wait_for_selector(&selectors, Duration::from_millis(600))
            .await
            .unwrap_err();
        assert!(err.is_navigation());
        assert!(started.elapsed() >= Duration::from_millis(600));

        page.close().await;
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn back_restores_listing_handles() {
        let server = MockServer::start().await;
        Mock::given(path("/list"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<html><body><a href="/detail">Details</a></body></html>"#,
                "text/html",
            ))
            .mount(&server)
            .await;
        Mock::given(path("/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<html><body><a href="nit.pdf">NIT</a></body></html>"#,
                "text/html",
            ))
            .mount(&server)
            .await;

        let mut page = launch().await;
        let list = Url::parse(&format!("{}/list", server.uri())).unwrap();
        page.goto(&list, Duration::from_secs(10)).await.unwrap();
        let links = page.query_all("a[href]").await.unwrap();

        page.click(links[0], Duration::from_secs(10)).await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/detail");
        assert!(page.inner_text(links[0]).await.is_err());

        page.go_back(Duration::from_secs(10)).await.unwrap();
        assert_eq!(page.inner_text(links[0]).await.unwrap().trim(), "Details");

        page.close().await;
    }
}

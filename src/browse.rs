use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use chrono::Local;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::{info_time, warn_time, Error, Result, READY_POLL_INTERVAL_MS, READY_TIMEOUT_MS};

// Fixed structural locators. The portal ships no ids or stable classes on
// these controls, so any markup change breaks them. Results render into
// the document's single direct `body > table`, which the search-form page
// doesn't have; scoping the locator to that path keeps the readiness wait
// from matching the layout tables already present before submit.
const SEARCH_INPUT: &str = r#"form input[type="text"]"#;
const SEARCH_SUBMIT: &str = r#"form input[type="submit"]"#;
const RESULTS_TABLE: &str = "body > table > tbody";

/// One headless-browser session, scoped to a single run.
///
/// Owns the browser process, a single page and the spawned CDP event
/// handler. [`Session::close`] must run on every exit path; the pipeline
/// holds the session only long enough to pull the rendered results HTML.
pub struct Session {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Session {
    /// Launches headless Chrome and opens a blank page.
    pub async fn launch(config: &Config) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if let Some(chrome_path) = &config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }
        builder = builder
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        let browser_config = builder.build().map_err(Error::Session)?;

        let (mut browser, mut handler) = Browser::launch(browser_config).await?;
        // The CDP connection only makes progress while its event stream is
        // polled.
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(e.into());
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Loads the portal's search page, submits `query` and waits until the
    /// results table has rendered.
    pub async fn open_and_search(&self, base_url: &str, query: &str) -> Result<()> {
        info_time!("Opening {}", base_url);
        self.page
            .goto(base_url)
            .await
            .map_err(|e| Error::Navigation(format!("loading `{base_url}`: {e}")))?;
        self.wait_for(SEARCH_INPUT, READY_TIMEOUT_MS).await?;

        let search_input = self
            .page
            .find_element(SEARCH_INPUT)
            .await
            .map_err(|e| Error::Navigation(format!("search input `{SEARCH_INPUT}`: {e}")))?;
        search_input
            .click()
            .await
            .map_err(|e| Error::Navigation(format!("focusing the search input: {e}")))?;
        search_input
            .type_str(query)
            .await
            .map_err(|e| Error::Navigation(format!("typing the query: {e}")))?;

        let submit = self
            .page
            .find_element(SEARCH_SUBMIT)
            .await
            .map_err(|e| Error::Navigation(format!("submit control `{SEARCH_SUBMIT}`: {e}")))?;
        submit
            .click()
            .await
            .map_err(|e| Error::Navigation(format!("submitting the search: {e}")))?;

        // If the table never shows up this is a render failure, not an
        // empty result set; zero results still render an empty table.
        self.wait_for(RESULTS_TABLE, READY_TIMEOUT_MS).await?;
        info_time!("Results table rendered for query: {:?}", query);
        Ok(())
    }

    /// The rendered HTML of the current page.
    pub async fn results_html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// Polls for `selector` until it resolves or `timeout_ms` elapses.
    /// Replaces fixed-duration sleeps with an observable readiness signal.
    async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::ReadyTimeout {
                    selector: selector.to_owned(),
                    timeout_ms,
                });
            }
            tokio::time::sleep(Duration::from_millis(READY_POLL_INTERVAL_MS)).await;
        }
    }

    /// Best-effort shutdown: the run's outcome is already decided by the
    /// time this is called, so close failures are only logged.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn_time!("Couldn't close the browser cleanly: {}", e);
        }
        self.handler.abort();
    }
}

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, SetDownloadBehaviorBehavior,
    SetDownloadBehaviorParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Result, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The process-wide browser handle: one Chromium instance, its event
/// handler task, and the single page every listing is driven through.
/// Downloads land in the scratch directory configured at launch.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    pub async fn launch(headless: bool, download_dir: &Path) -> Result<Self> {
        debug!("Launching browser, headless = {headless}");
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::BrowserSetup)?;
        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler: {e}");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(
            SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(download_dir.to_string_lossy().into_owned())
                .events_enabled(true)
                .build()
                .map_err(ScrapeError::BrowserSetup)?,
        )
        .await?;

        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|source| ScrapeError::Navigation {
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    pub async fn try_find(&self, selector: &str) -> Option<Element> {
        self.page.find_element(selector).await.ok()
    }

    /// Polls for `selector` until it matches or `timeout` expires.
    pub async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::SelectorTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    pub async fn element_text(&self, selector: &str) -> Result<String> {
        self.page
            .find_element(selector)
            .await?
            .inner_text()
            .await?
            .ok_or_else(|| ScrapeError::MissingText {
                selector: selector.to_string(),
            })
    }

    /// Subscribes to the download lifecycle events of this session. Must
    /// be called before the download is triggered so the terminal event
    /// cannot be missed.
    pub async fn download_events(
        &self,
    ) -> Result<impl Stream<Item = Arc<EventDownloadProgress>> + Unpin> {
        Ok(self.page.event_listener::<EventDownloadProgress>().await?)
    }

    pub async fn close(mut self) -> Result<()> {
        debug!("Closing browser");
        self.browser.close().await?;
        self.handler_task.abort();
        Ok(())
    }
}

/// Waits for the single terminal event of the in-flight download.
pub async fn await_terminal(
    mut events: impl Stream<Item = Arc<EventDownloadProgress>> + Unpin,
    id: &str,
) -> Result<()> {
    while let Some(event) = events.next().await {
        match event.state {
            DownloadProgressState::Completed => return Ok(()),
            DownloadProgressState::Canceled => {
                return Err(ScrapeError::DownloadCanceled { id: id.to_string() })
            }
            DownloadProgressState::InProgress => {
                debug!(
                    "Download progress: {}/{} bytes",
                    event.received_bytes, event.total_bytes
                );
            }
        }
    }
    Err(ScrapeError::DownloadEventsClosed)
}

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{NavigateParams, StopLoadingParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warta_core::{Error, Result};

use super::{timeout_error, PageDriver, SessionLauncher};
use crate::config::BrowserOptions;

/// Set on the outgoing document so readiness polling cannot mistake it for
/// the page being loaded.
const STALE_MARKER_SCRIPT: &str = "window.__wartaStale = true";

/// DOM parsed is enough; sub-resources are not waited for.
const READY_SCRIPT: &str = "!window.__wartaStale && document.readyState !== 'loading'";

const READY_POLL: Duration = Duration::from_millis(100);

fn cdp_error(context: &'static str) -> impl Fn(CdpError) -> Error {
    move |e| Error::Browser(format!("{}: {}", context, e))
}

fn session_closed() -> Error {
    Error::Browser("browser session already closed".to_string())
}

/// Requests of these types are failed before they leave the browser.
fn blocked_resource_patterns() -> Vec<RequestPattern> {
    [
        ResourceType::Image,
        ResourceType::Stylesheet,
        ResourceType::Font,
        ResourceType::Media,
    ]
    .into_iter()
    .map(|resource_type| {
        RequestPattern::builder()
            .resource_type(resource_type)
            .request_stage(RequestStage::Request)
            .build()
    })
    .collect()
}

#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    options: BrowserOptions,
}

impl BrowserLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if let Some(ref path) = self.options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        // with_head means NOT headless
        if !self.options.headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))
    }
}

#[async_trait]
impl SessionLauncher for BrowserLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        info!("🌐 Launching browser (headless={})", self.options.headless);

        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(cdp_error("Failed to launch browser"))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let mut session = BrowserSession {
            browser: Some(browser),
            page: None,
            tasks: vec![handler_task],
        };

        if let Err(e) = session.prepare_page(&self.options.user_agent).await {
            session.close().await?;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// One Chromium process with a single tab. Closing is async; if the session is
/// dropped without it, `Browser`'s own drop kills the child process.
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Page>,
    tasks: Vec<JoinHandle<()>>,
}

impl BrowserSession {
    async fn prepare_page(&mut self, user_agent: &str) -> Result<()> {
        let browser = self.browser.as_ref().ok_or_else(session_closed)?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(cdp_error("Failed to open tab"))?;

        page.execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
            .await
            .map_err(cdp_error("Failed to set user agent"))?;

        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(cdp_error("Failed to listen for requests"))?;
        page.execute(
            EnableParams::builder()
                .patterns(blocked_resource_patterns())
                .build(),
        )
        .await
        .map_err(cdp_error("Failed to enable request interception"))?;

        let interceptor = page.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
                if let Err(e) = interceptor.execute(fail).await {
                    debug!("Could not block {}: {}", event.request.url, e);
                }
            }
        }));

        self.page = Some(page);
        Ok(())
    }
}

async fn navigate(page: &Page, url: &str) -> Result<String> {
    page.evaluate(STALE_MARKER_SCRIPT.to_string())
        .await
        .map_err(cdp_error("Failed to prepare navigation"))?;

    let params = NavigateParams::builder()
        .url(url)
        .build()
        .map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
    let response = page
        .execute(params)
        .await
        .map_err(cdp_error("Navigation failed"))?;
    if let Some(ref reason) = response.result.error_text {
        return Err(Error::Browser(format!("Navigation to {} failed: {}", url, reason)));
    }

    loop {
        match page.evaluate(READY_SCRIPT.to_string()).await {
            Ok(result) => {
                if result.into_value::<bool>().unwrap_or(false) {
                    break;
                }
            }
            // The execution context is swapped out mid-navigation
            Err(e) => debug!("Ready check on {} failed: {}", url, e),
        }
        tokio::time::sleep(READY_POLL).await;
    }

    page.content()
        .await
        .map_err(cdp_error("Failed to read page content"))
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<String> {
        let page = self.page.clone().ok_or_else(session_closed)?;
        debug!("Navigating to {}", url);

        match tokio::time::timeout(timeout, navigate(&page, url)).await {
            Ok(result) => result,
            Err(_) => {
                if let Err(e) = page.execute(StopLoadingParams::default()).await {
                    debug!("Failed to stop loading {}: {}", url, e);
                }
                Err(timeout_error(url, timeout))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            debug!("Browser closed");
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if self.browser.is_some() {
            warn!("Browser session dropped without close, killing the browser process");
        }
    }
}

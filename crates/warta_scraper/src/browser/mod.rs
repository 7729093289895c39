//! Page sessions used by a crawl.
//!
//! A crawl owns exactly one session for its whole duration: the listing page
//! and every candidate page are loaded one after another in the same tab.
//! `BrowserSession` drives headless Chromium over CDP; `HttpSession` fetches
//! the initial HTML only, for hosts without a Chromium install.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use warta_core::{Error, Result};

use crate::config::BrowserOptions;

#[cfg(feature = "browser")]
mod chrome;
mod http;

#[cfg(feature = "browser")]
pub use chrome::{BrowserLauncher, BrowserSession};
pub use http::{HttpLauncher, HttpSession};

/// One tab reused for every navigation of a crawl.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigates to `url` and returns the document HTML once the DOM has been
    /// parsed. Fails with `Error::Timeout` when `timeout` elapses first.
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<String>;

    /// Releases the session. Calling it twice is harmless.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Engine {
    /// Headless Chromium
    Browser,
    /// Plain HTTP fetch of the initial HTML
    Http,
}

pub fn launcher_for(engine: Engine, options: BrowserOptions) -> Result<Arc<dyn SessionLauncher>> {
    match engine {
        #[cfg(feature = "browser")]
        Engine::Browser => Ok(Arc::new(BrowserLauncher::new(options))),
        #[cfg(not(feature = "browser"))]
        Engine::Browser => Err(Error::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser".to_string(),
        )),
        Engine::Http => Ok(Arc::new(HttpLauncher::new(options.user_agent))),
    }
}

pub(crate) fn timeout_error(url: &str, timeout: Duration) -> Error {
    Error::Timeout(format!("loading {} took longer than {}s", url, timeout.as_secs()))
}

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use warta_core::{Error, Result};

use super::{timeout_error, PageDriver, SessionLauncher};

#[derive(Debug, Clone)]
pub struct HttpLauncher {
    user_agent: String,
}

impl HttpLauncher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self { user_agent: user_agent.into() }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        let client = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(Box::new(HttpSession { client: Some(client) }))
    }
}

/// Fetches pages without rendering them; images, styles and fonts are never
/// requested in the first place.
pub struct HttpSession {
    client: Option<reqwest::Client>,
}

#[async_trait]
impl PageDriver for HttpSession {
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| Error::Scraping("HTTP session already closed".to_string()))?;

        debug!("GET {}", url);
        let fetch = async {
            let response = client.get(url).send().await?.error_for_status()?;
            Ok::<_, reqwest::Error>(response.text().await?)
        };

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) if e.is_timeout() => Err(timeout_error(url, timeout)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(timeout_error(url, timeout)),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.client = None;
        Ok(())
    }
}

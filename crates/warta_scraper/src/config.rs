use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome identity presented to crawled sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const LISTING_TIMEOUT: Duration = Duration::from_secs(120);
pub const CANDIDATE_TIMEOUT: Duration = Duration::from_secs(20);
pub const CANDIDATE_LIMIT: usize = 50;

/// Tunables for one crawl.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub listing_timeout: Duration,
    pub candidate_timeout: Duration,
    /// Upper bound on detail pages visited per crawl
    pub candidate_limit: usize,
    /// Year treated as "current" by the link heuristics; `None` follows the clock
    pub current_year: Option<i32>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_timeout: LISTING_TIMEOUT,
            candidate_timeout: CANDIDATE_TIMEOUT,
            candidate_limit: CANDIDATE_LIMIT,
            current_year: None,
        }
    }
}

/// How the browser session is started.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

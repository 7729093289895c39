use std::sync::Arc;
use warta_core::ArticleStorage;
use warta_scraper::ScraperManager;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub scraper: Arc<ScraperManager>,
}

impl AppState {
    /// Shares the manager's storage with the article routes.
    pub fn new(scraper: ScraperManager) -> Self {
        Self {
            storage: scraper.storage(),
            scraper: Arc::new(scraper),
        }
    }
}

use chrono::{Datelike, Local, NaiveDateTime};
use std::sync::Arc;
use url::Url;
use warta_core::{
    ArticleStorage, DateRange, EnrichedCandidate, Error, NewArticle, Result, ScrapeResult,
};

use crate::assemble::assemble;
use crate::browser::{PageDriver, SessionLauncher};
use crate::config::ScrapeConfig;
use crate::filter::filter_candidates;
use crate::harvest::harvest_html;
use crate::logging::Logger;
use crate::metadata::extract;

pub const NO_CANDIDATES_MESSAGE: &str =
    "Scraping finished, but no candidate articles were found on the page.";
pub const NO_RESULTS_MESSAGE: &str =
    "Scraping finished, but no articles were found within the requested date range.";

/// Runs crawls: one listing page in, deduplicated articles out.
pub struct ScraperManager {
    storage: Arc<dyn ArticleStorage>,
    launcher: Arc<dyn SessionLauncher>,
    config: ScrapeConfig,
}

impl ScraperManager {
    pub fn new(storage: Arc<dyn ArticleStorage>, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            storage,
            launcher,
            config: ScrapeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScrapeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn storage(&self) -> Arc<dyn ArticleStorage> {
        self.storage.clone()
    }

    pub async fn scrape_and_save(&self, url: &str, range: &DateRange) -> Result<ScrapeResult> {
        self.scrape_and_save_at(url, range, Local::now().naive_local()).await
    }

    /// Same as [`scrape_and_save`](Self::scrape_and_save) with relative dates
    /// ("2 jam lalu") resolved against `now`.
    pub async fn scrape_and_save_at(
        &self,
        url: &str,
        range: &DateRange,
        now: NaiveDateTime,
    ) -> Result<ScrapeResult> {
        let base = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        let logger = Logger::new().with_prefix(format!("[{}]", base.host_str().unwrap_or(url)));
        logger.info(&format!(
            "🚀 Starting scrape of {} ({} to {})",
            base, range.start, range.end
        ));

        let current_year = self.config.current_year.unwrap_or_else(|| now.year());

        let mut page = self.launcher.launch().await?;
        let crawl = self.crawl(page.as_mut(), &base, current_year, &logger).await;
        if let Err(e) = page.close().await {
            logger.warn(&format!("Failed to close session: {}", e));
        }
        let enriched = crawl?;

        if enriched.is_empty() {
            logger.warn("No candidate articles found");
            return Ok(ScrapeResult::empty(NO_CANDIDATES_MESSAGE));
        }

        let articles = assemble(&enriched, range, now);
        logger.debug(&format!("{} articles after date filtering", articles.len()));
        if articles.is_empty() {
            logger.warn("No articles inside the date range");
            return Ok(ScrapeResult::empty(NO_RESULTS_MESSAGE));
        }

        let (inserted, skipped) = self.save_articles(&articles, &logger).await;
        logger.info(&format!("✅ {} saved, {} skipped", inserted, skipped));

        Ok(ScrapeResult {
            success: true,
            message: format!(
                "Scraping finished! {} new articles saved to the database.",
                inserted
            ),
            count: inserted,
            skipped,
            total_found: articles.len(),
        })
    }

    async fn crawl(
        &self,
        page: &mut dyn PageDriver,
        base: &Url,
        current_year: i32,
        logger: &Logger,
    ) -> Result<Vec<EnrichedCandidate>> {
        logger.info("🌐 Opening listing page");
        let html = page.open(base.as_str(), self.config.listing_timeout).await?;

        let harvested = harvest_html(&html, base, current_year);
        logger.debug(&format!("{} links passed the harvest rules", harvested.len()));
        let candidates = filter_candidates(harvested);
        logger.info(&format!("🔗 {} candidate articles", candidates.len()));

        Ok(extract(
            page,
            &candidates,
            self.config.candidate_limit,
            self.config.candidate_timeout,
            logger,
        )
        .await)
    }

    /// Stores each article on its own. A failed row is logged and counted as
    /// skipped; rows stored before it stay stored. Returns (inserted, skipped).
    pub async fn save_articles(&self, articles: &[NewArticle], logger: &Logger) -> (usize, usize) {
        let mut inserted = 0;
        let mut skipped = 0;

        for article in articles {
            match self.store_new(article).await {
                Ok(true) => inserted += 1,
                Ok(false) => {
                    logger.debug(&format!("Already stored: {}", article.url));
                    skipped += 1;
                }
                Err(e) => {
                    logger.error(&format!("Failed to save {}: {}", article.url, e));
                    skipped += 1;
                }
            }
        }

        (inserted, skipped)
    }

    async fn store_new(&self, article: &NewArticle) -> Result<bool> {
        if self.storage.check_url_exists(&article.url).await?.is_some() {
            return Ok(false);
        }
        self.storage.create(article).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use warta_core::{Article, ArticlePage, ArticleQuery, BulkInsertResult};
    use warta_storage::backends::memory::InMemoryStorage;

    /// Memory store whose inserts fail for urls containing "rusak".
    struct FlakyStorage {
        inner: InMemoryStorage,
    }

    #[async_trait]
    impl ArticleStorage for FlakyStorage {
        async fn check_url_exists(&self, url: &str) -> Result<Option<i64>> {
            self.inner.check_url_exists(url).await
        }

        async fn create(&self, article: &NewArticle) -> Result<Article> {
            if article.url.contains("rusak") {
                return Err(Error::Database("disk I/O error".to_string()));
            }
            self.inner.create(article).await
        }

        async fn create_bulk(&self, articles: &[NewArticle]) -> Result<BulkInsertResult> {
            self.inner.create_bulk(articles).await
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
            self.inner.find_by_id(id).await
        }

        async fn find_all(&self, query: &ArticleQuery) -> Result<ArticlePage> {
            self.inner.find_all(query).await
        }

        async fn find_latest(&self, count: i64) -> Result<Vec<Article>> {
            self.inner.find_latest(count).await
        }

        async fn delete_by_id(&self, id: i64) -> Result<Option<Article>> {
            self.inner.delete_by_id(id).await
        }

        async fn delete_all(&self) -> Result<u64> {
            self.inner.delete_all().await
        }

        async fn count(&self) -> Result<u64> {
            self.inner.count().await
        }

        async fn export_all(&self) -> Result<Vec<Article>> {
            self.inner.export_all().await
        }
    }

    struct NoSession;

    #[async_trait]
    impl SessionLauncher for NoSession {
        async fn launch(&self) -> Result<Box<dyn PageDriver>> {
            Err(Error::Browser("no browser in tests".to_string()))
        }
    }

    fn article(url: &str) -> NewArticle {
        NewArticle {
            publish_date: Some("10-01-2024 08:00".to_string()),
            content_snippet: Some("N/A".to_string()),
            ..NewArticle::new("Judul berita yang cukup panjang", url)
        }
    }

    #[tokio::test]
    async fn test_save_is_best_effort() {
        let storage = Arc::new(FlakyStorage { inner: InMemoryStorage::new() });
        let manager = ScraperManager::new(storage.clone(), Arc::new(NoSession));

        let articles = vec![
            article("https://x.id/berita/1"),
            article("https://x.id/berita/rusak"),
            article("https://x.id/berita/1"),
            article("https://x.id/berita/3"),
        ];
        let (inserted, skipped) = manager.save_articles(&articles, &Logger::new()).await;

        assert_eq!((inserted, skipped), (2, 2));
        assert_eq!(storage.count().await.unwrap(), 2);
        assert!(storage.check_url_exists("https://x.id/berita/3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let manager = ScraperManager::new(Arc::new(InMemoryStorage::new()), Arc::new(NoSession));
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let err = manager.scrape_and_save("https://x.id/indeks", &range).await.unwrap_err();
        assert!(matches!(err, Error::Browser(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_launch() {
        let manager = ScraperManager::new(Arc::new(InMemoryStorage::new()), Arc::new(NoSession));
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let err = manager.scrape_and_save("not a url", &range).await.unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}

use async_trait::async_trait;
use crate::types::{Article, ArticlePage, ArticleQuery, BulkInsertResult, NewArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Returns the id of the article stored under `url`, if any
    async fn check_url_exists(&self, url: &str) -> Result<Option<i64>>;

    /// Insert a single article. Callers check for duplicates first; a
    /// colliding url is still rejected by the backend.
    async fn create(&self, article: &NewArticle) -> Result<Article>;

    /// Insert a batch inside one transaction. Invalid entries and known urls
    /// are skipped; any other failure rolls back the whole batch.
    async fn create_bulk(&self, articles: &[NewArticle]) -> Result<BulkInsertResult>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Filtered, paginated listing, newest first
    async fn find_all(&self, query: &ArticleQuery) -> Result<ArticlePage>;

    async fn find_latest(&self, count: i64) -> Result<Vec<Article>>;

    async fn delete_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Removes every article, returning how many were deleted
    async fn delete_all(&self) -> Result<u64>;

    async fn count(&self) -> Result<u64>;

    /// Every article, oldest first
    async fn export_all(&self) -> Result<Vec<Article>>;
}

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use warta_core::{
    Article, ArticlePage, ArticleQuery, ArticleStorage, BulkInsertResult, Error, NewArticle, Result,
};
use crate::StorageBackend;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    last_id: i64,
}

impl MemoryStore {
    pub fn find_url(&self, url: &str) -> Option<i64> {
        self.articles.iter().find(|a| a.url == url).map(|a| a.id)
    }

    pub fn insert(&mut self, article: &NewArticle) -> Result<Article> {
        if !article.is_valid() {
            return Err(Error::InvalidInput("title and url are required".to_string()));
        }
        if let Some(id) = self.find_url(&article.url) {
            return Err(Error::Database(format!(
                "UNIQUE constraint failed: articles.url ({} already stored as {})",
                article.url, id
            )));
        }
        self.last_id += 1;
        let row = article.to_article(self.last_id);
        self.articles.push(row.clone());
        Ok(row)
    }

    fn matching<'a>(&'a self, query: &'a ArticleQuery) -> impl Iterator<Item = &'a Article> + 'a {
        let needle = query.search_term().map(str::to_lowercase);
        self.articles.iter().rev().filter(move |a| {
            a.id > query.from_id
                && needle
                    .as_deref()
                    .map_or(true, |n| a.title.to_lowercase().contains(n))
        })
    }
}

/// Process-local storage; everything is lost when it is dropped.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> where Self: Sized {
        Ok(InMemoryStorage::new())
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn check_url_exists(&self, url: &str) -> Result<Option<i64>> {
        Ok(self.store.read().await.find_url(url))
    }

    async fn create(&self, article: &NewArticle) -> Result<Article> {
        self.store.write().await.insert(article)
    }

    async fn create_bulk(&self, articles: &[NewArticle]) -> Result<BulkInsertResult> {
        let mut store = self.store.write().await;
        // Work on a copy so a failure leaves the committed rows untouched.
        let mut staged = store.clone();
        let mut result = BulkInsertResult::default();

        for article in articles {
            if !article.is_valid() || staged.find_url(&article.url).is_some() {
                result.skipped_count += 1;
                continue;
            }
            let row = staged.insert(article)?;
            result.inserted.push(row);
            result.inserted_count += 1;
        }

        *store = staged;
        Ok(result)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn find_all(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let store = self.store.read().await;
        let total = store.matching(query).count() as i64;
        let data = store
            .matching(query)
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();

        Ok(ArticlePage {
            data,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn find_latest(&self, count: i64) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store
            .articles
            .iter()
            .rev()
            .take(count.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Article>> {
        let mut store = self.store.write().await;
        let position = store.articles.iter().position(|a| a.id == id);
        Ok(position.map(|idx| store.articles.remove(idx)))
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut store = self.store.write().await;
        let deleted = store.articles.len() as u64;
        store.articles.clear();
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.store.read().await.articles.len() as u64)
    }

    async fn export_all(&self) -> Result<Vec<Article>> {
        Ok(self.store.read().await.articles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn article(title: &str, url: &str) -> NewArticle {
        NewArticle::new(title, url)
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStorage::new();
        let created = storage.create(&article("Test Article", "http://test.com/1")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.publish_date, "N/A");

        assert_eq!(storage.check_url_exists("http://test.com/1").await.unwrap(), Some(1));
        assert_eq!(storage.check_url_exists("http://test.com/2").await.unwrap(), None);
        assert!(storage.create(&article("Again", "http://test.com/1")).await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_skips_duplicates_within_batch() {
        let storage = InMemoryStorage::new();
        let result = storage
            .create_bulk(&[article("A", "http://x/1"), article("A2", "http://x/1")])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.inserted[0].title, "A");
    }

    #[tokio::test]
    async fn test_bulk_skips_invalid_entries() {
        let storage = InMemoryStorage::new();
        let result = storage
            .create_bulk(&[article("", "http://x/1"), article("B", ""), article("C", "http://x/3")])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.skipped_count, 2);
    }

    #[tokio::test]
    async fn test_overlapping_bulk_inserts_keep_urls_unique() {
        let storage = InMemoryStorage::new();
        let first: Vec<_> = (0..5).map(|i| article("T", &format!("http://x/{}", i))).collect();
        let second: Vec<_> = (3..8).map(|i| article("T", &format!("http://x/{}", i))).collect();

        storage.create_bulk(&first).await.unwrap();
        let result = storage.create_bulk(&second).await.unwrap();
        assert_eq!(result.inserted_count, 3);
        assert_eq!(result.skipped_count, 2);

        let all = storage.export_all().await.unwrap();
        let urls: HashSet<_> = all.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls.len(), all.len());
        assert_eq!(all.len(), 8);
    }

    #[tokio::test]
    async fn test_find_all_filters_and_paginates() {
        let storage = InMemoryStorage::new();
        for i in 1..=6 {
            let title = if i % 2 == 0 { format!("Banjir {}", i) } else { format!("Pemilu {}", i) };
            storage.create(&article(&title, &format!("http://x/{}", i))).await.unwrap();
        }

        let page = storage
            .find_all(&ArticleQuery { limit: 2, search: Some("banjir".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].id, 6);

        let page = storage
            .find_all(&ArticleQuery { from_id: 4, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let storage = InMemoryStorage::new();
        storage.create(&article("One", "http://x/1")).await.unwrap();
        storage.create(&article("Two", "http://x/2")).await.unwrap();

        assert_eq!(storage.delete_by_id(1).await.unwrap().map(|a| a.title), Some("One".into()));
        assert!(storage.delete_by_id(1).await.unwrap().is_none());
        assert_eq!(storage.delete_all().await.unwrap(), 1);
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let storage = InMemoryStorage::new();
        for (i, title) in ["Diskon 50% hari ini", "Diskon 500 ribu", "Kode promo_baru", "Kode promo baru"]
            .iter()
            .enumerate()
        {
            storage.create(&article(title, &format!("http://x/{}", i))).await.unwrap();
        }

        for (term, expected) in [("50%", 1), ("promo_baru", 1), ("%", 1), ("diskon", 2)] {
            let page = storage
                .find_all(&ArticleQuery { search: Some(term.into()), ..Default::default() })
                .await
                .unwrap();
            assert_eq!(page.total, expected, "search {:?}", term);
        }
    }
}

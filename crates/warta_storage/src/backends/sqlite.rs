use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use warta_core::{
    Article, ArticlePage, ArticleQuery, ArticleStorage, BulkInsertResult, Error, NewArticle, Result,
};
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        publish_date TEXT NOT NULL DEFAULT 'N/A',
        content_snippet TEXT NOT NULL DEFAULT ''
    )
    "#,
    // Add future migrations here
];

const COLUMNS: &str = "id, title, url, publish_date, content_snippet";

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./articles.db"
    }

    async fn new() -> Result<Self> {
        Self::new_with_path(Path::new("articles.db")).await
    }
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let decode = db_error("Failed to decode article row");
    Ok(Article {
        id: row.try_get("id").map_err(&decode)?,
        title: row.try_get("title").map_err(&decode)?,
        url: row.try_get("url").map_err(&decode)?,
        publish_date: row.try_get("publish_date").map_err(&decode)?,
        content_snippet: row.try_get("content_snippet").map_err(&decode)?,
    })
}

/// Makes `%` and `_` in a search term match literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn rows_to_articles(rows: &[SqliteRow]) -> Result<Vec<Article>> {
    rows.iter().map(row_to_article).collect()
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        // Run migrations
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn insert_batch(
        tx: &mut Transaction<'_, Sqlite>,
        articles: &[NewArticle],
    ) -> Result<BulkInsertResult> {
        let mut result = BulkInsertResult::default();

        for article in articles {
            if !article.is_valid() {
                result.skipped_count += 1;
                continue;
            }

            let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE url = ?")
                .bind(&article.url)
                .fetch_optional(&mut **tx)
                .await
                .map_err(db_error("Failed to check url"))?;
            if existing.is_some() {
                result.skipped_count += 1;
                continue;
            }

            let row = sqlx::query(&format!(
                "INSERT INTO articles (title, url, publish_date, content_snippet) VALUES (?, ?, ?, ?) RETURNING {}",
                COLUMNS
            ))
            .bind(&article.title)
            .bind(&article.url)
            .bind(article.publish_date_or_default())
            .bind(article.content_snippet_or_default())
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error("Failed to store article"))?;

            result.inserted.push(row_to_article(&row)?);
            result.inserted_count += 1;
        }

        Ok(result)
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn check_url_exists(&self, url: &str) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT id FROM articles WHERE url = ?")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to check url"))
    }

    async fn create(&self, article: &NewArticle) -> Result<Article> {
        if !article.is_valid() {
            return Err(Error::InvalidInput("title and url are required".to_string()));
        }

        let row = sqlx::query(&format!(
            "INSERT INTO articles (title, url, publish_date, content_snippet) VALUES (?, ?, ?, ?) RETURNING {}",
            COLUMNS
        ))
        .bind(&article.title)
        .bind(&article.url)
        .bind(article.publish_date_or_default())
        .bind(article.content_snippet_or_default())
        .fetch_one(&*self.pool)
        .await
        .map_err(db_error("Failed to store article"))?;

        row_to_article(&row)
    }

    async fn create_bulk(&self, articles: &[NewArticle]) -> Result<BulkInsertResult> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        match Self::insert_batch(&mut tx, articles).await {
            Ok(result) => {
                tx.commit().await.map_err(db_error("Failed to commit batch"))?;
                debug!(
                    "Bulk insert committed: {} inserted, {} skipped",
                    result.inserted_count, result.skipped_count
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Bulk insert failed, rolling back: {}", e);
                if let Err(rollback) = tx.rollback().await {
                    warn!("Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get article"))?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_all(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let pattern = query.search_term().map(|s| format!("%{}%", escape_like(s)));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE (?1 IS NULL OR title LIKE ?1 ESCAPE '\\') AND id > ?2",
        )
        .bind(pattern.as_deref())
        .bind(query.from_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(db_error("Failed to count articles"))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM articles
            WHERE (?1 IS NULL OR title LIKE ?1 ESCAPE '\') AND id > ?2
            ORDER BY id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            COLUMNS
        ))
        .bind(pattern.as_deref())
        .bind(query.from_id)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_error("Failed to list articles"))?;

        Ok(ArticlePage {
            data: rows_to_articles(&rows)?,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn find_latest(&self, count: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!("SELECT {} FROM articles ORDER BY id DESC LIMIT ?", COLUMNS))
            .bind(count)
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to get latest articles"))?;

        rows_to_articles(&rows)
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("DELETE FROM articles WHERE id = ? RETURNING {}", COLUMNS))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to delete article"))?;

        row.as_ref().map(row_to_article).transpose()
    }

    async fn delete_all(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM articles")
            .execute(&*self.pool)
            .await
            .map_err(db_error("Failed to delete articles"))?;

        Ok(done.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(db_error("Failed to count articles"))?;

        Ok(total as u64)
    }

    async fn export_all(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!("SELECT {} FROM articles ORDER BY id ASC", COLUMNS))
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to export articles"))?;

        rows_to_articles(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn article(title: &str, url: &str) -> NewArticle {
        NewArticle::new(title, url)
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        // Create a temporary directory for the test database
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let mut new = article("Test Article", "http://example.com/1");
        new.publish_date = Some("16-10-2026 09:00".to_string());

        let created = storage.create(&new).await.unwrap();
        assert_eq!(created.publish_date, "16-10-2026 09:00");
        assert_eq!(created.content_snippet, "");
        assert_eq!(storage.check_url_exists("http://example.com/1").await.unwrap(), Some(created.id));
        assert_eq!(storage.find_by_id(created.id).await.unwrap(), Some(created.clone()));

        // The unique index rejects a second row for the same url
        assert!(storage.create(&article("Other", "http://example.com/1")).await.is_err());
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_dedup_within_batch() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("bulk.db")).await.unwrap();

        let result = storage
            .create_bulk(&[article("A", "http://x/1"), article("A2", "http://x/1")])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.skipped_count, 1);
    }

    #[tokio::test]
    async fn test_repeated_overlapping_bulk_inserts() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("overlap.db")).await.unwrap();

        for start in 0..3 {
            let batch: Vec<_> = (start..start + 4)
                .map(|i| article("Judul", &format!("http://x/{}", i)))
                .collect();
            storage.create_bulk(&batch).await.unwrap();
        }

        let all = storage.export_all().await.unwrap();
        let urls: HashSet<_> = all.iter().map(|a| a.url.clone()).collect();
        assert_eq!(all.len(), 6);
        assert_eq!(urls.len(), all.len());
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_query_and_delete() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("query.db")).await.unwrap();
        for i in 1..=5 {
            storage
                .create(&article(&format!("Berita Banjir {}", i), &format!("http://x/{}", i)))
                .await
                .unwrap();
        }

        let page = storage
            .find_all(&ArticleQuery { limit: 2, offset: 1, search: Some("banjir".into()), from_id: 0 })
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.data.iter().map(|a| a.id).collect::<Vec<_>>(), vec![4, 3]);

        let latest = storage.find_latest(1).await.unwrap();
        assert_eq!(latest[0].id, 5);

        let deleted = storage.delete_by_id(2).await.unwrap();
        assert_eq!(deleted.map(|a| a.url), Some("http://x/2".to_string()));
        assert_eq!(storage.delete_all().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_search_wildcards_are_literal() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(&temp_dir.path().join("like.db")).await.unwrap();
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

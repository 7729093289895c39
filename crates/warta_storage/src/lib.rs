use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use warta_core::{ArticleStorage, Error, Result};

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn new() -> Result<Self> where Self: Sized;
}

/// Open the backend named `kind` (`memory` or `sqlite`).
pub async fn create_storage(kind: &str, database: Option<&Path>) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => Ok(Arc::new(InMemoryStorage::new())),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = match database {
                Some(path) => SQLiteStorage::new_with_path(path).await,
                None => <SQLiteStorage as StorageBackend>::new().await,
            }
            .map_err(|e| Error::Storage(format!("{} ({})", e, SQLiteStorage::get_error_message())))?;
            tracing::info!("🗄️ SQLite database at {}", storage.get_db_path().display());
            Ok(Arc::new(storage))
        }
        other => {
            let _ = database;
            Err(Error::Storage(format!("Unsupported storage backend: {}", other)))
        }
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage("memory", None).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        assert!(create_storage("qdrant", None).await.is_err());
    }
}

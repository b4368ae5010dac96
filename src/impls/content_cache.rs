use crate::storage::{InMemoryStorage, OnDiskStorage};
use async_trait::async_trait;
use radio_sessions::{CacheTtl, ContentCache, ContentCacheError};

#[async_trait]
impl ContentCache for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ContentCacheError> {
        Ok(InMemoryStorage::get(self, key).await)
    }

    async fn set(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), ContentCacheError> {
        self.save(key, value, ttl.as_duration()).await;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ContentCacheError> {
        InMemoryStorage::delete(self, key).await;

        Ok(())
    }
}

#[async_trait]
impl ContentCache for OnDiskStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ContentCacheError> {
        OnDiskStorage::get(self, key)
            .await
            .map_err(|error| ContentCacheError::new(error))
    }

    async fn set(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), ContentCacheError> {
        self.save(key, value, ttl.as_duration())
            .await
            .map_err(|error| ContentCacheError::new(error))
    }

    async fn delete(&self, key: &str) -> Result<(), ContentCacheError> {
        OnDiskStorage::delete(self, key)
            .await
            .map_err(|error| ContentCacheError::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    async fn check_ttl_semantics(cache: Arc<dyn ContentCache>) {
        cache
            .set("handle:abc", "\"file-1\"", CacheTtl::Forever)
            .await
            .unwrap();
        cache
            .set("search:rock::20", "[]", CacheTtl::Seconds(0))
            .await
            .unwrap();
        cache
            .set("search:jazz::20", "[]", CacheTtl::Seconds(3600))
            .await
            .unwrap();

        actix_rt::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            cache.get("handle:abc").await.unwrap().as_deref(),
            Some("\"file-1\"")
        );
        assert_eq!(cache.get("search:rock::20").await.unwrap(), None);
        assert!(cache.get("search:jazz::20").await.unwrap().is_some());

        cache.delete("handle:abc").await.unwrap();
        assert_eq!(cache.get("handle:abc").await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn should_honour_ttl_in_memory() {
        check_ttl_semantics(Arc::new(InMemoryStorage::new())).await;
    }

    #[actix_rt::test]
    async fn should_honour_ttl_on_disk() {
        let directory = tempfile::tempdir().unwrap();

        check_ttl_semantics(Arc::new(OnDiskStorage::create(
            directory.path().to_path_buf(),
        )))
        .await;
    }

    #[actix_rt::test]
    async fn should_serve_concurrent_readers_consistently() {
        let cache: Arc<dyn ContentCache> = Arc::new(InMemoryStorage::new());
        cache.set("k", "v", CacheTtl::Forever).await.unwrap();

        let handles = (0..20)
            .map(|_| {
                let cache = cache.clone();
                actix_rt::spawn(async move { cache.get("k").await.unwrap() })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert_eq!(handle.await.unwrap().as_deref(), Some("v"));
        }
    }
}

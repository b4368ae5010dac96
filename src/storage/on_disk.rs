use async_lock::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs::create_dir_all;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    value: String,
    /// Seconds since the unix epoch; absent entries never expire.
    expires_at: Option<u64>,
}

impl StoredEntry {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}

/// Key-value store keeping one JSON file per key, so cached handles survive
/// restarts. A single lock makes read, expiry and removal atomic.
pub(crate) struct OnDiskStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OnDiskStorage {
    pub(crate) fn create(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    // Keys are free text; file names are derived from them deterministically.
    fn entry_path(&self, key: &str) -> PathBuf {
        let name = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());

        self.path.join(format!("{}.{}", name, ENTRY_EXTENSION))
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Option<String>, std::io::Error> {
        let _guard = self.lock.lock().await;
        let path = self.entry_path(key);

        let entry = match read_entry(&path).await? {
            Some(entry) if entry.key == key => entry,
            _ => return Ok(None),
        };

        if entry.is_expired(unix_now()) {
            remove_if_exists(&path).await?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    pub(crate) async fn save(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), std::io::Error> {
        let _guard = self.lock.lock().await;

        create_dir_all(&self.path).await?;

        let entry = StoredEntry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at: ttl.map(|ttl| unix_now() + ttl.as_secs()),
        };
        let contents = serde_json::to_vec(&entry)?;

        let temp_path = self.path.join(format!(".{}.tmp", Uuid::new_v4()));

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .await?;

        file.write_all(&contents).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&temp_path, self.entry_path(key)).await?;

        Ok(())
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<(), std::io::Error> {
        let _guard = self.lock.lock().await;

        remove_if_exists(&self.entry_path(key)).await
    }

    /// Drops expired and unreadable entries. Returns how many were removed.
    pub(crate) async fn purge_expired(&self) -> Result<usize, std::io::Error> {
        let _guard = self.lock.lock().await;
        let now = unix_now();
        let mut removed = 0;

        let mut dir_reader = match tokio::fs::read_dir(&self.path).await {
            Ok(reader) => reader,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(error),
        };

        while let Some(dir) = dir_reader.next_entry().await? {
            let path = dir.path();

            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }

            let stale = match read_entry(&path).await {
                Ok(Some(entry)) => entry.is_expired(now),
                Ok(None) => false,
                Err(error) => {
                    warn!(?error, path = %path.display(), "Dropping unreadable cache entry");
                    true
                }
            };

            if stale {
                remove_if_exists(&path).await?;
                removed += 1;
            }
        }

        debug!(removed, "Expired cache entries purged");

        Ok(removed)
    }
}

async fn read_entry(path: &Path) -> Result<Option<StoredEntry>, std::io::Error> {
    match tokio::fs::read(path).await {
        Ok(contents) => Ok(Some(serde_json::from_slice(&contents)?)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

async fn remove_if_exists(path: &Path) -> Result<(), std::io::Error> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn should_persist_values_between_instances() {
        let directory = tempfile::tempdir().unwrap();

        OnDiskStorage::create(directory.path().to_path_buf())
            .save("handle:abc", "\"file-1\"", None)
            .await
            .unwrap();

        let reopened = OnDiskStorage::create(directory.path().to_path_buf());

        assert_eq!(
            reopened.get("handle:abc").await.unwrap().as_deref(),
            Some("\"file-1\"")
        );
    }

    #[actix_rt::test]
    async fn should_accept_arbitrary_keys() {
        let directory = tempfile::tempdir().unwrap();
        let storage = OnDiskStorage::create(directory.path().to_path_buf());

        storage
            .save("search:../../etc/passwd 1970s:20", "[]", None)
            .await
            .unwrap();

        assert!(storage
            .get("search:../../etc/passwd 1970s:20")
            .await
            .unwrap()
            .is_some());
        assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 1);
    }

    #[actix_rt::test]
    async fn should_remove_expired_entry_on_read() {
        let directory = tempfile::tempdir().unwrap();
        let storage = OnDiskStorage::create(directory.path().to_path_buf());

        storage
            .save("search:rock", "[]", Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(storage.get("search:rock").await.unwrap(), None);
        assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 0);
    }

    #[actix_rt::test]
    async fn should_purge_only_expired_entries() {
        let directory = tempfile::tempdir().unwrap();
        let storage = OnDiskStorage::create(directory.path().to_path_buf());

        storage.save("a", "1", Some(Duration::ZERO)).await.unwrap();
        storage.save("b", "2", None).await.unwrap();
        storage
            .save("c", "3", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        std::fs::write(directory.path().join("garbage.json"), b"not json").unwrap();

        let removed = storage.purge_expired().await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(storage.get("b").await.unwrap().as_deref(), Some("2"));
        assert_eq!(storage.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[actix_rt::test]
    async fn should_treat_missing_directory_as_empty() {
        let directory = tempfile::tempdir().unwrap();
        let storage = OnDiskStorage::create(directory.path().join("missing"));

        assert_eq!(storage.get("a").await.unwrap(), None);
        assert_eq!(storage.purge_expired().await.unwrap(), 0);
        storage.delete("a").await.unwrap();
    }
}

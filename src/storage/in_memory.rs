use async_lock::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Process-local key-value store with per-entry expiry.
pub(crate) struct InMemoryStorage {
    storage: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStorage {
    pub(crate) fn new() -> Self {
        Self {
            storage: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn save(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let mut guard = self.storage.lock().await;

        guard.insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
    }

    /// Expired entries are removed under the same lock that found them.
    pub(crate) async fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.storage.lock().await;

        match guard.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                guard.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub(crate) async fn delete(&self, key: &str) {
        let mut guard = self.storage.lock().await;

        guard.remove(key);
    }

    /// Drops every expired entry, including ones nobody reads again.
    pub(crate) async fn purge_expired(&self) -> usize {
        let mut guard = self.storage.lock().await;
        let now = Instant::now();
        let before = guard.len();

        guard.retain(|_, entry| !entry.is_expired(now));

        before - guard.len()
    }

    pub(crate) async fn purge_periodically(self: Arc<Self>, interval: Duration) {
        loop {
            actix_rt::time::sleep(interval).await;

            let purged = self.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Expired cache entries purged");
            }
        }
    }
}

//! Expired-Entry Sweeper
//!
//! Reads never remove expired entries, so the memory backend keeps them
//! until this task reclaims them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a task that purges expired cache entries every `cleanup_interval_secs`.
///
/// Backends with native expiry report nothing to purge. Abort the returned
/// handle on shutdown.
pub fn spawn_cleanup_task(cache: CacheStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds (backend: {})",
            interval.as_secs(),
            cache.backend_name()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired().await;
            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use std::sync::Arc;

    fn store() -> (CacheStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (CacheStore::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let (cache, backend) = store();
        cache
            .set("photo:expire_soon", "value", Duration::from_millis(200))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len().await, 0, "expired entry should have been swept");
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let (cache, backend) = store();
        cache
            .set("photo:long_lived", "value", Duration::from_secs(3600))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(backend.len().await, 1);
        let value: Option<String> = cache.get("photo:long_lived").await.unwrap();
        assert_eq!(value.as_deref(), Some("value"));
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let (cache, _) = store();
        let handle = spawn_cleanup_task(cache, 1);

        handle.abort();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}

//! In-Process Cache Backend
//!
//! A reader/writer locked map used when no remote cache is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::entry::{current_timestamp_ms, CacheEntry};
use crate::cache::store::CacheBackend;
use crate::error::Result;

// == Memory Backend ==
/// Map from qualified key to serialized entry.
///
/// Reads never remove anything; an expired entry simply reads as absent
/// until it is overwritten or swept by [`CacheBackend::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let backend = MemoryBackend::new();
        let ttl = Duration::from_secs(60);

        backend.set("k", "1".to_string(), ttl).await.unwrap();
        backend.set("k", "2".to_string(), ttl).await.unwrap();

        assert_eq!(backend.get("k").await.unwrap(), Some("2".to_string()));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_absent_but_stays() {
        let backend = MemoryBackend::new();
        backend.set("k", "1".to_string(), Duration::from_millis(50)).await.unwrap();

        assert!(backend.get("k").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(backend.get("k").await.unwrap().is_none());
        assert_eq!(backend.len().await, 1, "Reads must not evict");
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let backend = MemoryBackend::new();
        backend.set("gone", "1".to_string(), Duration::ZERO).await.unwrap();
        backend.set("kept", "2".to_string(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(backend.purge_expired().await, 1);
        assert_eq!(backend.len().await, 1);
        assert!(backend.get("kept").await.unwrap().is_some());
    }
}

//! Cache Store Module
//!
//! The backend-independent cache-aside layer. Values are JSON encoded before
//! they reach a backend, and every key is namespaced with [`KEY_PREFIX`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::flight::SingleFlight;
use crate::cache::stats::{CacheCounters, CacheStats};
use crate::cache::KEY_PREFIX;
use crate::error::Result;

// == Cache Backend ==
/// Raw key/value storage with expiry.
///
/// Keys arrive fully qualified and values already serialized.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name for logs and stats, e.g. "memory" or "redis".
    fn name(&self) -> &'static str;

    /// Returns the stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value that expires `ttl` from now, overwriting any previous one.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Drops expired entries. Backends with native expiry have nothing to do.
    async fn purge_expired(&self) -> usize {
        0
    }
}

// == Cache Store ==
/// Shared handle over the backend selected at startup.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    counters: Arc<CacheCounters>,
    flights: Arc<SingleFlight>,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            counters: Arc::new(CacheCounters::new()),
            flights: Arc::new(SingleFlight::new()),
        }
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // == Get ==
    /// Reads and decodes a value.
    ///
    /// A key that was never written, or whose TTL has elapsed, is `Ok(None)`.
    /// A value that no longer decodes into `T` is an error, not a hit.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let result = self.read(key).await;
        match &result {
            Ok(Some(_)) => self.counters.record_hit(),
            Ok(None) => self.counters.record_miss(),
            Err(_) => self.counters.record_error(),
        }
        result
    }

    // == Set ==
    /// Encodes and stores a value under `key` for `ttl`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        let result = self.backend.set(&qualify(key), encoded, ttl).await;
        if result.is_err() {
            self.counters.record_error();
        }
        result
    }

    // == Get Or Compute ==
    /// Cache-aside read: returns the cached value, or runs `compute`, stores
    /// its output for `ttl` and returns it.
    ///
    /// Backend failures never surface here. A failed read is recomputed and
    /// a failed write is logged. Concurrent misses on one key wait for a
    /// single computation and then re-read its result, which counts as a
    /// hit. Each call records exactly one hit or miss. A failed computation
    /// is returned to the caller and nothing is stored.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &str, ttl: Duration, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let _flight = self.flights.acquire(key).await;
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }
        self.counters.record_miss();

        let value = compute().await?;
        if let Err(e) = self.set(key, &value, ttl).await {
            warn!(key, backend = self.backend.name(), "cache write failed: {}", e);
        }
        Ok(value)
    }

    // == Maintenance ==
    /// Drops expired entries from backends that keep them around.
    pub async fn purge_expired(&self) -> usize {
        self.backend.purge_expired().await
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Hits and errors are counted here; the miss is counted by the caller
    /// once it commits to computing.
    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read(key).await {
            Ok(Some(value)) => {
                debug!(key, "cache hit");
                self.counters.record_hit();
                Some(value)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                self.counters.record_error();
                warn!(key, backend = self.backend.name(), "cache read failed, recomputing: {}", e);
                None
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(&qualify(key)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

fn qualify(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

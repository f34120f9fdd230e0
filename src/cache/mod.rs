//! Cache Module
//!
//! Cache-aside storage with TTL expiration over a memory or Redis backend.

mod entry;
mod flight;
mod memory;
mod remote;
mod stats;
mod store;


use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

// Re-export public types
pub use entry::CacheEntry;
pub use flight::SingleFlight;
pub use memory::MemoryBackend;
pub use remote::RedisBackend;
pub use stats::{CacheCounters, CacheStats};
pub use store::{CacheBackend, CacheStore};

// == Public Constants ==
/// Namespace prepended to every key so the gallery can share a Redis instance.
pub const KEY_PREFIX: &str = "toomorephotos:";

/// Upper bound on the startup probe of the remote cache.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// == Backend Selection ==
/// Builds the cache store for this process.
///
/// Uses Redis when a URL is configured and reachable, and the in-process map
/// otherwise. An unreachable Redis is logged and never stops startup.
pub async fn connect(redis_url: Option<&str>) -> CacheStore {
    let Some(url) = redis_url else {
        info!("Cache: using in-memory backend (REDIS_URL not set)");
        return CacheStore::new(Arc::new(MemoryBackend::new()));
    };

    match tokio::time::timeout(CONNECT_TIMEOUT, RedisBackend::connect(url)).await {
        Ok(Ok(backend)) => {
            info!("Cache: using Redis backend");
            CacheStore::new(Arc::new(backend))
        }
        Ok(Err(e)) => {
            warn!("Cache: Redis connect failed ({}), falling back to memory", e);
            CacheStore::new(Arc::new(MemoryBackend::new()))
        }
        Err(_) => {
            warn!("Cache: Redis connect timed out, falling back to memory");
            CacheStore::new(Arc::new(MemoryBackend::new()))
        }
    }
}

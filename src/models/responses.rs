//! Response DTOs for the gallery API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{Photo, PhotoDetail, PhotoDimensions};

/// Response body for the index page (GET /)
#[derive(Debug, Clone, Serialize)]
pub struct IndexResponse {
    /// Tag selected for this rotation slot
    pub tag: String,
    pub photos: Vec<Photo>,
}

/// Response body for a photo page (GET /p/:slug)
#[derive(Debug, Clone, Serialize)]
pub struct PhotoPageResponse {
    pub photo: PhotoDetail,
    /// Missing when the upstream has no usable size for this photo
    pub dimensions: Option<PhotoDimensions>,
    pub related: Vec<Photo>,
}

/// Response body for the sitemap (GET /sitemap)
#[derive(Debug, Clone, Serialize)]
pub struct SitemapResponse {
    pub photos: Vec<Photo>,
    /// Valid values of the index `t` parameter
    pub tag_pages: Vec<usize>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Active cache backend
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(backend: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            backend: backend.into(),
            hits: stats.hits,
            misses: stats.misses,
            errors: stats.errors,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            errors: 1,
        };
        let resp = StatsResponse::new("memory", stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.backend, "memory");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_photo_page_without_dimensions() {
        let resp = PhotoPageResponse {
            photo: PhotoDetail {
                id: "1".to_string(),
                owner: "me".to_string(),
                owner_name: "Me".to_string(),
                title: "Title".to_string(),
                description: String::new(),
                tags: vec!["japan".to_string()],
                posted: 0,
                secret: "s".to_string(),
                server: "1".to_string(),
                farm: 1,
                license: "4".to_string(),
            },
            dimensions: None,
            related: vec![],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["dimensions"].is_null());
        assert_eq!(json["photo"]["tags"][0], "japan");
    }
}

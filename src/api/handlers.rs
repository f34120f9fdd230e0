//! API Handlers
//!
//! HTTP request handlers for each gallery view.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Timelike;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GalleryError, Result};
use crate::gallery::Gallery;
use crate::models::{
    Feed, HealthResponse, IndexResponse, PhotoPageResponse, SitemapResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
}

impl AppState {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            gallery: Arc::new(gallery),
        }
    }
}

/// Query string of the index page.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    /// Rotation slot; anything but an integer means the current minute
    pub t: Option<String>,
}

/// Handler for GET /
///
/// Shows the photos of one curated tag. The tag rotates with the current
/// minute unless `?t=` pins a slot.
pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<IndexResponse>> {
    let slot = query
        .t
        .and_then(|t| t.trim().parse::<i64>().ok())
        .unwrap_or_else(|| i64::from(chrono::Utc::now().minute()));
    let tag = state
        .gallery
        .tag_for_slot(slot)
        .ok_or_else(|| GalleryError::NotFound("no tags configured".to_string()))?;

    let photos = state.gallery.search_by_tag(tag).await?;
    Ok(Json(IndexResponse {
        tag: tag.to_string(),
        photos,
    }))
}

/// Handler for GET /p/:slug
///
/// The slug starts with the photo id and may carry a readable suffix
/// (`/p/123-kyoto`). Photos of other accounts are not shown.
pub async fn photo_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PhotoPageResponse>> {
    let photo_id = photo_id_from_slug(&slug)
        .ok_or_else(|| GalleryError::NotFound(format!("no photo id in '{}'", slug)))?;

    let photo = state.gallery.photo_detail(photo_id).await?;
    if photo.owner != state.gallery.user_id() {
        return Err(GalleryError::NotFound(format!("photo {}", photo_id)));
    }

    let dimensions = match state.gallery.photo_dimensions(photo_id).await {
        Ok(dimensions) => dimensions,
        Err(e) => {
            debug!(photo_id, "dimensions unavailable: {}", e);
            None
        }
    };
    let related = state
        .gallery
        .related_photos(photo_id, &photo.tags)
        .await
        .unwrap_or_default();

    Ok(Json(PhotoPageResponse {
        photo,
        dimensions,
        related,
    }))
}

/// Handler for GET /sitemap
pub async fn sitemap_handler(State(state): State<AppState>) -> Result<Json<SitemapResponse>> {
    let photos = state.gallery.all_photos().await?;
    Ok(Json(SitemapResponse {
        photos,
        tag_pages: (0..state.gallery.tags().len()).collect(),
    }))
}

/// Handler for GET /feed
pub async fn feed_handler(State(state): State<AppState>) -> Result<Json<Feed>> {
    Ok(Json(state.gallery.feed().await?))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.gallery.cache();
    Json(StatsResponse::new(cache.backend_name(), cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Leading digits of a photo slug.
fn photo_id_from_slug(slug: &str) -> Option<&str> {
    let end = slug
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(slug.len());
    (end > 0).then(|| &slug[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_id_from_slug() {
        assert_eq!(photo_id_from_slug("53000000001"), Some("53000000001"));
        assert_eq!(photo_id_from_slug("123-kyoto-at-night"), Some("123"));
        assert_eq!(photo_id_from_slug("kyoto"), None);
        assert_eq!(photo_id_from_slug(""), None);
    }
}

//! Error types for the gallery service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Gallery Error Enum ==
/// Unified error type for the gallery service.
#[derive(Error, Debug)]
pub enum GalleryError {
    /// Requested page or photo does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream API answered with a non-success status
    #[error("Not available: {0}")]
    Unavailable(String),

    /// Upstream API could not be reached or returned garbage
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Cache backend failure (connectivity or serialization)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Durable store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Conversions ==
impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        GalleryError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        GalleryError::Cache(format!("serialization: {}", err))
    }
}

impl From<redis::RedisError> for GalleryError {
    fn from(err: redis::RedisError) -> Self {
        GalleryError::Cache(err.to_string())
    }
}

impl From<sqlx::Error> for GalleryError {
    fn from(err: sqlx::Error) -> Self {
        GalleryError::Storage(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GalleryError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            GalleryError::Unavailable(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            GalleryError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            GalleryError::Cache(msg)
            | GalleryError::Storage(msg)
            | GalleryError::Config(msg)
            | GalleryError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gallery service.
pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_maps_to_not_found() {
        let response = GalleryError::Unavailable("photo 1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let response = GalleryError::Upstream("timeout".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_serde_error_becomes_cache_error() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(GalleryError::from(err), GalleryError::Cache(_)));
    }
}

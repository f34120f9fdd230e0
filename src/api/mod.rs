//! API Module
//!
//! JSON views of the gallery.
//!
//! # Endpoints
//! - `GET /` - Index page for one curated tag
//! - `GET /p/:slug` - Photo page
//! - `GET /sitemap` - All photos
//! - `GET /feed` - Syndication feed
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

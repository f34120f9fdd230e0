//! Domain models and response DTOs for the gallery.

pub mod feed;
pub mod photo;
pub mod responses;

// Re-export commonly used types
pub use feed::{Feed, FeedAuthor, FeedItem};
pub use photo::{Photo, PhotoDetail, PhotoDimensions, PhotoSize, PREFERRED_SIZE_LABELS};
pub use responses::{
    HealthResponse, IndexResponse, PhotoPageResponse, SitemapResponse, StatsResponse,
};

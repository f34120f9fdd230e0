//! Durable photo store.
//!
//! Filled by the sync command and consulted before the upstream API when
//! configured. [`PgRepository`] backs production; [`MemoryRepository`] is
//! used by tests and single-process setups.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Photo, PhotoDetail, PhotoDimensions};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// One synced photo: metadata plus the dimensions picked at sync time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub detail: PhotoDetail,
    /// 0 when the upstream had no usable size
    pub width: i64,
    pub height: i64,
}

impl StoredPhoto {
    /// Dimensions, or `None` when the sync recorded 0×0.
    pub fn dimensions(&self) -> Option<PhotoDimensions> {
        let dimensions = PhotoDimensions {
            width: self.width,
            height: self.height,
        };
        dimensions.is_valid().then_some(dimensions)
    }
}

// == Photo Repository ==
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Confirms the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Inserts or replaces a photo and its full tag list.
    async fn upsert_photo(
        &self,
        photo_id: &str,
        detail: &PhotoDetail,
        width: i64,
        height: i64,
    ) -> Result<()>;

    async fn get_photo(&self, photo_id: &str) -> Result<Option<StoredPhoto>>;

    /// Photos carrying `tag`, newest post first.
    async fn photos_by_tag(&self, tag: &str) -> Result<Vec<Photo>>;

    /// Every stored photo, newest post first.
    async fn all_photos(&self) -> Result<Vec<Photo>>;
}

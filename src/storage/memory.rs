//! In-process photo repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PhotoRepository, StoredPhoto};
use crate::error::Result;
use crate::models::{Photo, PhotoDetail};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    photos: RwLock<HashMap<String, StoredPhoto>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.photos.read().await.len()
    }

    async fn listing<F>(&self, keep: F) -> Vec<Photo>
    where
        F: Fn(&StoredPhoto) -> bool,
    {
        let photos = self.photos.read().await;
        let mut matched: Vec<&StoredPhoto> = photos.values().filter(|p| keep(p)).collect();
        matched.sort_by(|a, b| {
            b.detail
                .posted
                .cmp(&a.detail.posted)
                .then_with(|| a.detail.id.cmp(&b.detail.id))
        });
        matched.into_iter().map(|p| p.detail.summary()).collect()
    }
}

#[async_trait]
impl PhotoRepository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_photo(
        &self,
        photo_id: &str,
        detail: &PhotoDetail,
        width: i64,
        height: i64,
    ) -> Result<()> {
        let stored = StoredPhoto {
            detail: detail.clone(),
            width,
            height,
        };
        self.photos.write().await.insert(photo_id.to_string(), stored);
        Ok(())
    }

    async fn get_photo(&self, photo_id: &str) -> Result<Option<StoredPhoto>> {
        Ok(self.photos.read().await.get(photo_id).cloned())
    }

    async fn photos_by_tag(&self, tag: &str) -> Result<Vec<Photo>> {
        let wanted = tag.trim().to_lowercase();
        Ok(self
            .listing(|p| p.detail.tags.iter().any(|t| t.trim().to_lowercase() == wanted))
            .await)
    }

    async fn all_photos(&self) -> Result<Vec<Photo>> {
        Ok(self.listing(|_| true).await)
    }
}

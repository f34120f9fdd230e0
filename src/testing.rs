//! Hand-written fakes shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{GalleryError, Result};
use crate::models::{Photo, PhotoDetail, PhotoSize};
use crate::upstream::{PhotoSource, SearchQuery};

pub const OWNER: &str = "92438116@N00";

pub fn photo(id: &str) -> Photo {
    Photo {
        id: id.to_string(),
        owner: OWNER.to_string(),
        title: format!("title {}", id),
        secret: "secret".to_string(),
        server: "65535".to_string(),
        farm: 66,
        is_public: true,
    }
}

pub fn private_photo(id: &str) -> Photo {
    Photo {
        is_public: false,
        ..photo(id)
    }
}

pub fn detail(id: &str, tags: &[&str], posted: i64) -> PhotoDetail {
    PhotoDetail {
        id: id.to_string(),
        owner: OWNER.to_string(),
        owner_name: "toomore".to_string(),
        title: format!("title {}", id),
        description: format!("about {}", id),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        posted,
        secret: "secret".to_string(),
        server: "65535".to_string(),
        farm: 66,
        license: "4".to_string(),
    }
}

/// Scripted [`PhotoSource`] that counts its calls.
#[derive(Default)]
pub struct FakeSource {
    all: Vec<Photo>,
    by_tag: HashMap<String, Vec<Photo>>,
    details: HashMap<String, PhotoDetail>,
    sizes: HashMap<String, Vec<PhotoSize>>,
    failing_tags: HashSet<String>,
    failing_listing: bool,
    info_delays: HashMap<String, Duration>,
    search_delay: Duration,
    pub search_calls: AtomicUsize,
    pub info_calls: AtomicUsize,
    pub sizes_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all(mut self, photos: Vec<Photo>) -> Self {
        self.all = photos;
        self
    }

    pub fn with_tag(mut self, tag: &str, photos: Vec<Photo>) -> Self {
        self.by_tag.insert(tag.to_string(), photos);
        self
    }

    pub fn with_failing_tag(mut self, tag: &str) -> Self {
        self.failing_tags.insert(tag.to_string());
        self
    }

    /// Makes the untagged catalog listing fail.
    pub fn with_failing_listing(mut self) -> Self {
        self.failing_listing = true;
        self
    }

    pub fn with_detail(mut self, detail: PhotoDetail) -> Self {
        self.details.insert(detail.id.clone(), detail);
        self
    }

    pub fn with_sizes(mut self, photo_id: &str, sizes: Vec<(&str, i64, i64)>) -> Self {
        let sizes = sizes
            .into_iter()
            .map(|(label, width, height)| PhotoSize {
                label: label.to_string(),
                width,
                height,
            })
            .collect();
        self.sizes.insert(photo_id.to_string(), sizes);
        self
    }

    pub fn with_info_delay(mut self, photo_id: &str, delay: Duration) -> Self {
        self.info_delays.insert(photo_id.to_string(), delay);
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn info_lookups(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PhotoSource for FakeSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Photo>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if !self.search_delay.is_zero() {
            tokio::time::sleep(self.search_delay).await;
        }
        match &query.tags {
            Some(tag) if self.failing_tags.contains(tag) => {
                Err(GalleryError::Unavailable(format!("search {} failed", tag)))
            }
            Some(tag) => Ok(self.by_tag.get(tag).cloned().unwrap_or_default()),
            None if self.failing_listing => {
                Err(GalleryError::Unavailable("search stat=fail".to_string()))
            }
            None => Ok(self.all.clone()),
        }
    }

    async fn photo_info(&self, photo_id: &str) -> Result<PhotoDetail> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.info_delays.get(photo_id) {
            tokio::time::sleep(*delay).await;
        }
        self.details
            .get(photo_id)
            .cloned()
            .ok_or_else(|| GalleryError::Unavailable(format!("Photo {} not found", photo_id)))
    }

    async fn photo_sizes(&self, photo_id: &str) -> Result<Vec<PhotoSize>> {
        self.sizes_calls.fetch_add(1, Ordering::SeqCst);
        self.sizes
            .get(photo_id)
            .cloned()
            .ok_or_else(|| GalleryError::Unavailable(format!("Photo {} not found", photo_id)))
    }
}

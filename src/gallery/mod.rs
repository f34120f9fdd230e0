//! Gallery Service
//!
//! Binds each resource kind to a cache key, a TTL and a fetch function.
//! Handlers, the related selector and the feed assembler all read through
//! here, so every upstream call is shared across consumers.

mod feed;
mod related;

use std::sync::Arc;

use tracing::warn;

use crate::cache::CacheStore;
use crate::config::{CacheTtls, Config};
use crate::error::{GalleryError, Result};
use crate::models::{Feed, Photo, PhotoDetail, PhotoDimensions};
use crate::storage::PhotoRepository;
use crate::upstream::{PhotoSource, SearchQuery, TagMode};

pub use feed::{FEED_CONCURRENCY, FEED_LIMIT};
pub use related::{pick_other_tag, tag_hash, MAX_RELATED, OTHER_TAG_LIMIT, SAME_TAG_LIMIT};

const DEFAULT_SITE_URL: &str = "https://photos.toomore.net";

// == Gallery ==
pub struct Gallery {
    source: Arc<dyn PhotoSource>,
    cache: CacheStore,
    repository: Option<Arc<dyn PhotoRepository>>,
    tags: Vec<String>,
    tag_mode: TagMode,
    ttls: CacheTtls,
    user_id: String,
    site_url: String,
}

impl Gallery {
    pub fn new(source: Arc<dyn PhotoSource>, cache: CacheStore, tags: Vec<String>) -> Self {
        Self {
            source,
            cache,
            repository: None,
            tags,
            tag_mode: TagMode::default(),
            ttls: CacheTtls::default(),
            user_id: String::new(),
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }

    /// Gallery with every policy knob taken from `config`.
    pub fn from_config(
        config: &Config,
        source: Arc<dyn PhotoSource>,
        cache: CacheStore,
        tags: Vec<String>,
    ) -> Self {
        Self::new(source, cache, tags)
            .with_tag_mode(config.tag_mode)
            .with_ttls(config.ttls)
            .with_user_id(&config.user_id)
            .with_site_url(&config.site_url)
    }

    pub fn with_repository(mut self, repository: Arc<dyn PhotoRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn with_tag_mode(mut self, tag_mode: TagMode) -> Self {
        self.tag_mode = tag_mode;
        self
    }

    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_site_url(mut self, site_url: &str) -> Self {
        self.site_url = site_url.trim_end_matches('/').to_string();
        self
    }

    // == Accessors ==
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Tag shown in rotation slot `slot`; slots wrap around the tag set.
    pub fn tag_for_slot(&self, slot: i64) -> Option<&str> {
        if self.tags.is_empty() {
            return None;
        }
        let index = slot.rem_euclid(self.tags.len() as i64) as usize;
        self.tags.get(index).map(String::as_str)
    }

    // == Search By Tag ==
    /// Photos carrying `tag`, newest first. Cached under `index:<tag>`.
    pub async fn search_by_tag(&self, tag: &str) -> Result<Vec<Photo>> {
        let key = format!("index:{}", tag);
        self.cache
            .get_or_compute(&key, self.ttls.index, || async {
                if let Some(repository) = &self.repository {
                    if let Some(photos) = stored(repository.photos_by_tag(tag).await, "tag listing")
                        .filter(|photos| !photos.is_empty())
                    {
                        return Ok(photos);
                    }
                }
                self.source
                    .search(&SearchQuery::by_tag(tag, self.tag_mode))
                    .await
            })
            .await
    }

    // == Photo Detail ==
    /// Full metadata for one photo. Cached under `photo:<id>`.
    pub async fn photo_detail(&self, photo_id: &str) -> Result<PhotoDetail> {
        let key = format!("photo:{}", photo_id);
        self.cache
            .get_or_compute(&key, self.ttls.photo, || async {
                if let Some(repository) = &self.repository {
                    let photo = stored(repository.get_photo(photo_id).await, "photo").flatten();
                    if let Some(photo) = photo {
                        return Ok(photo.detail);
                    }
                }
                self.source.photo_info(photo_id).await
            })
            .await
    }

    // == Photo Dimensions ==
    /// Dimensions of the displayed rendition, or `None` when the upstream
    /// offers no usable size. Only valid dimensions are cached, under
    /// `photosizes:<id>`.
    pub async fn photo_dimensions(&self, photo_id: &str) -> Result<Option<PhotoDimensions>> {
        let key = format!("photosizes:{}", photo_id);
        let result = self
            .cache
            .get_or_compute(&key, self.ttls.photo_sizes, || async {
                if let Some(repository) = &self.repository {
                    if let Some(dimensions) = stored(repository.get_photo(photo_id).await, "photo")
                        .flatten()
                        .and_then(|photo| photo.dimensions())
                    {
                        return Ok(dimensions);
                    }
                }
                fetch_dimensions(self.source.as_ref(), photo_id)
                    .await?
                    .ok_or_else(|| GalleryError::NotFound(format!("no usable size for {}", photo_id)))
            })
            .await;

        match result {
            Ok(dimensions) => Ok(Some(dimensions)),
            Err(GalleryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // == Related Photos ==
    /// Up to [`MAX_RELATED`] photos sharing or neighbouring `tags`.
    /// Cached under `related:<id>`.
    pub async fn related_photos(&self, photo_id: &str, tags: &[String]) -> Result<Vec<Photo>> {
        let key = format!("related:{}", photo_id);
        self.cache
            .get_or_compute(&key, self.ttls.related, || async {
                Ok(related::select(self, photo_id, tags).await)
            })
            .await
    }

    // == All Photos ==
    /// Whole-account listing, newest first. Cached under `sitemap`.
    pub async fn all_photos(&self) -> Result<Vec<Photo>> {
        self.cache
            .get_or_compute("sitemap", self.ttls.sitemap, || async {
                if let Some(repository) = &self.repository {
                    if let Some(photos) = stored(repository.all_photos().await, "listing")
                        .filter(|photos| !photos.is_empty())
                    {
                        return Ok(photos);
                    }
                }
                self.source.search(&SearchQuery::everything()).await
            })
            .await
    }

    // == Feed ==
    /// Syndication feed over the newest photos. Cached whole under `feed`.
    pub async fn feed(&self) -> Result<Feed> {
        self.cache
            .get_or_compute("feed", self.ttls.feed, || async {
                let photos = self.all_photos().await?;
                Ok(feed::assemble(self, &photos).await)
            })
            .await
    }
}

/// Fetches the size list and picks the displayed rendition.
pub async fn fetch_dimensions(
    source: &dyn PhotoSource,
    photo_id: &str,
) -> Result<Option<PhotoDimensions>> {
    let sizes = source.photo_sizes(photo_id).await?;
    Ok(PhotoDimensions::select(&sizes))
}

/// Repository read that falls through to the upstream on error.
fn stored<T>(result: Result<T>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Storage: {} read failed, using upstream: {}", what, e);
            None
        }
    }
}

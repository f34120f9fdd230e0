//! Upstream Photo API
//!
//! The [`PhotoSource`] trait is the only way the gallery talks to the photo
//! host. [`FlickrClient`] is the production implementation.

mod flickr;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GalleryError, Result};
use crate::models::{Photo, PhotoDetail, PhotoSize};

pub use flickr::FlickrClient;

// == Tag Mode ==
/// How a comma-joined tag list is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Photo must carry every tag
    #[default]
    All,
    /// Photo must carry at least one tag
    Any,
}

impl TagMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagMode::All => "all",
            TagMode::Any => "any",
        }
    }
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagMode {
    type Err = GalleryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TagMode::All),
            "any" => Ok(TagMode::Any),
            other => Err(GalleryError::Config(format!("unknown tag mode '{}'", other))),
        }
    }
}

// == Search Query ==
/// Search over the configured account, newest posts first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Comma-joined tags; `None` lists the whole account
    pub tags: Option<String>,
    pub tag_mode: TagMode,
}

impl SearchQuery {
    pub fn by_tag(tags: impl Into<String>, tag_mode: TagMode) -> Self {
        Self {
            tags: Some(tags.into()),
            tag_mode,
        }
    }

    pub fn everything() -> Self {
        Self::default()
    }
}

// == Photo Source ==
/// Read access to the photo host.
///
/// An API-level failure (the host answered, but not with success) is
/// reported as [`GalleryError::Unavailable`]; transport problems as
/// [`GalleryError::Upstream`]. Implementations never retry.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Every page of results for `query`, sorted by posting date descending.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Photo>>;

    /// Full metadata for one photo.
    async fn photo_info(&self, photo_id: &str) -> Result<PhotoDetail>;

    /// Every rendition the host offers for one photo.
    async fn photo_sizes(&self, photo_id: &str) -> Result<Vec<PhotoSize>>;
}

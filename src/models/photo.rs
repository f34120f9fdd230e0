//! Photo models shared by the upstream client, the caches and the views.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Size labels tried in order when picking the rendition to report.
pub const PREFERRED_SIZE_LABELS: [&str; 5] =
    ["Large", "Large 1024", "Large 1600", "Medium 800", "Medium 640"];

// == Photo ==
/// Summary record returned by searches and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub secret: String,
    pub server: String,
    pub farm: u32,
    pub is_public: bool,
}

// == Photo Detail ==
/// Full metadata for one photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDetail {
    pub id: String,
    pub owner: String,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    /// Raw tag strings as entered by the owner
    pub tags: Vec<String>,
    /// Posting time, Unix seconds
    pub posted: i64,
    pub secret: String,
    pub server: String,
    pub farm: u32,
    pub license: String,
}

impl PhotoDetail {
    pub fn posted_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.posted, 0)
            .single()
            .unwrap_or_default()
    }

    /// Static asset URL; `suffix` is a Flickr size letter such as `b` or `z`.
    pub fn image_url(&self, suffix: &str) -> String {
        image_url(self.farm, &self.server, &self.id, &self.secret, suffix)
    }

    /// Summary form, used when listings are served from the durable store.
    ///
    /// Only public photos are ever synced, so the summary is marked public.
    pub fn summary(&self) -> Photo {
        Photo {
            id: self.id.clone(),
            owner: self.owner.clone(),
            title: self.title.clone(),
            secret: self.secret.clone(),
            server: self.server.clone(),
            farm: self.farm,
            is_public: true,
        }
    }
}

// == Sizes ==
/// One entry of the upstream size list. Unparseable dimensions arrive as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub label: String,
    pub width: i64,
    pub height: i64,
}

impl PhotoSize {
    fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Width and height of the rendition shown on the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDimensions {
    pub width: i64,
    pub height: i64,
}

impl PhotoDimensions {
    // == Select ==
    /// Picks dimensions from a size list.
    ///
    /// Each preferred label is looked up by its first occurrence; if that
    /// entry has bad dimensions the next label is tried. When no preferred
    /// label yields a valid size, the first valid entry in list order wins.
    pub fn select(sizes: &[PhotoSize]) -> Option<Self> {
        PREFERRED_SIZE_LABELS
            .iter()
            .filter_map(|label| sizes.iter().find(|size| size.label == *label))
            .find(|size| size.is_valid())
            .or_else(|| sizes.iter().find(|size| size.is_valid()))
            .map(|size| Self {
                width: size.width,
                height: size.height,
            })
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

fn image_url(farm: u32, server: &str, id: &str, secret: &str, suffix: &str) -> String {
    format!(
        "https://farm{}.staticflickr.com/{}/{}_{}_{}.jpg",
        farm, server, id, secret, suffix
    )
}

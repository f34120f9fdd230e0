//! Syndication feed model. Serialized whole into the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedAuthor {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Stable item identifier (the photo page URL)
    pub id: String,
    pub title: String,
    pub link: String,
    /// HTML snippet shown by feed readers
    pub description: String,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: FeedAuthor,
    /// Timestamp of the newest item; `None` for an empty feed
    pub updated: Option<DateTime<Utc>>,
    pub items: Vec<FeedItem>,
}

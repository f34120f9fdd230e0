//! Configuration Module
//!
//! Handles loading gallery configuration from environment variables and the
//! curated tag file.

use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{GalleryError, Result};
use crate::upstream::TagMode;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Time-to-live for each cached resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Search-by-tag results for the index page
    pub index: Duration,
    /// Photo detail records
    pub photo: Duration,
    /// Photo dimensions (practically immutable)
    pub photo_sizes: Duration,
    /// Related photo sets
    pub related: Duration,
    /// Whole-account listing used by the sitemap and the feed
    pub sitemap: Duration,
    /// Assembled syndication feed
    pub feed: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            index: Duration::from_secs(10 * 60),
            photo: Duration::from_secs(30 * DAY_SECS),
            photo_sizes: Duration::from_secs(365 * DAY_SECS),
            related: Duration::from_secs(60 * 60),
            sitemap: Duration::from_secs(30 * 60),
            feed: Duration::from_secs(30 * 60),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Flickr API key
    pub api_key: String,
    /// Flickr API secret, used to sign requests when non-empty
    pub api_secret: String,
    /// Flickr auth token for the account owner
    pub auth_token: String,
    /// Account searches are scoped to
    pub user_id: String,
    /// Path of the curated tag file
    pub tags_file: String,
    /// Tag matching mode for tag searches
    pub tag_mode: TagMode,
    /// Optional Redis URL; selects the remote cache backend
    pub redis_url: Option<String>,
    /// Optional Postgres URL; enables the durable store
    pub database_url: Option<String>,
    /// Public base URL used for feed links
    pub site_url: String,
    /// Per-resource cache TTLs
    pub ttls: CacheTtls,
    /// Upstream calls per second during a catalog sync
    pub sync_rate_per_sec: u32,
    /// Expired-entry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `FLICKRAPIKEY`, `FLICKRSECRET`, `FLICKRUSERTOKEN`, `FLICKRUSER` - upstream credentials
    /// - `TAGS_FILE` - curated tag file (default: ./tags.txt)
    /// - `TAG_MODE` - `all` or `any` (default: all)
    /// - `REDIS_URL`, `DATABASE_URL` - optional backends
    /// - `SITE_URL` - public base URL (default: https://photos.toomore.net)
    /// - `*_CACHE_TTL` - per-resource TTLs in seconds
    /// - `SYNC_RATE_PER_SEC` - sync pacing (default: 2)
    /// - `CLEANUP_INTERVAL` - sweep frequency in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let ttl = |name: &str, fallback: Duration| {
            parse_var::<u64>(name)
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            api_key: env::var("FLICKRAPIKEY").unwrap_or_default(),
            api_secret: env::var("FLICKRSECRET").unwrap_or_default(),
            auth_token: env::var("FLICKRUSERTOKEN").unwrap_or_default(),
            user_id: env::var("FLICKRUSER").unwrap_or_default(),
            tags_file: env::var("TAGS_FILE").unwrap_or(defaults.tags_file),
            tag_mode: parse_var("TAG_MODE").unwrap_or(defaults.tag_mode),
            redis_url: non_empty_var("REDIS_URL"),
            database_url: non_empty_var("DATABASE_URL"),
            site_url: env::var("SITE_URL").unwrap_or(defaults.site_url),
            ttls: CacheTtls {
                index: ttl("INDEX_CACHE_TTL", defaults.ttls.index),
                photo: ttl("PHOTO_CACHE_TTL", defaults.ttls.photo),
                photo_sizes: ttl("PHOTO_SIZES_CACHE_TTL", defaults.ttls.photo_sizes),
                related: ttl("RELATED_CACHE_TTL", defaults.ttls.related),
                sitemap: ttl("SITEMAP_CACHE_TTL", defaults.ttls.sitemap),
                feed: ttl("FEED_CACHE_TTL", defaults.ttls.feed),
            },
            sync_rate_per_sec: parse_var("SYNC_RATE_PER_SEC")
                .filter(|rate| *rate > 0)
                .unwrap_or(defaults.sync_rate_per_sec),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Checks the credentials the upstream client cannot work without.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("FLICKRAPIKEY", &self.api_key),
            ("FLICKRUSER", &self.user_id),
        ];
        for (name, value) in required {
            if value.is_empty() {
                return Err(GalleryError::Config(format!(
                    "missing required environment variable {}",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            api_key: String::new(),
            api_secret: String::new(),
            auth_token: String::new(),
            user_id: String::new(),
            tags_file: "./tags.txt".to_string(),
            tag_mode: TagMode::All,
            redis_url: None,
            database_url: None,
            site_url: "https://photos.toomore.net".to_string(),
            ttls: CacheTtls::default(),
            sync_rate_per_sec: 2,
            cleanup_interval: 300,
        }
    }
}

// == Tag File ==
/// Reads the curated tag set, one tag per line.
///
/// Blank lines are skipped. A file without any tag is rejected, since the
/// index page rotates through these tags.
pub fn load_tags(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        GalleryError::Config(format!("cannot read tag file {}: {}", path.display(), e))
    })?;

    let tags: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if tags.is_empty() {
        return Err(GalleryError::Config(format!(
            "tag file {} has no tags",
            path.display()
        )));
    }
    Ok(tags)
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.tag_mode, TagMode::All);
        assert_eq!(config.ttls.index, Duration::from_secs(600));
        assert_eq!(config.ttls.photo_sizes, Duration::from_secs(365 * DAY_SECS));
        assert!(config.redis_url.is_none());
        assert_eq!(config.sync_rate_per_sec, 2);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(GalleryError::Config(_))));

        config.api_key = "key".to_string();
        config.user_id = "92438116@N00".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_tags_skips_blank_lines() {
        let path = env::temp_dir().join(format!("tags-{}.txt", std::process::id()));
        std::fs::write(&path, "japan\n\n  taiwan \nstreet\n").unwrap();

        let tags = load_tags(&path).unwrap();
        assert_eq!(tags, vec!["japan", "taiwan", "street"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_tags_rejects_empty_file() {
        let path = env::temp_dir().join(format!("empty-tags-{}.txt", std::process::id()));
        std::fs::write(&path, "\n\n").unwrap();

        assert!(matches!(load_tags(&path), Err(GalleryError::Config(_))));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_tags_missing_file() {
        let result = load_tags("/definitely/not/here/tags.txt");
        assert!(matches!(result, Err(GalleryError::Config(_))));
    }
}

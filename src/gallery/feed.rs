//! Feed assembly over the photo-detail cache.

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::Gallery;
use crate::models::{Feed, FeedAuthor, FeedItem, Photo, PhotoDetail};

/// Newest photos included in the feed.
pub const FEED_LIMIT: usize = 100;
/// Detail lookups in flight at once.
pub const FEED_CONCURRENCY: usize = 10;

const FEED_TITLE: &str = "Toomore Photos";
const FEED_DESCRIPTION: &str = "From here to see what I see.";
const AUTHOR_NAME: &str = "Toomore Chiang";
const AUTHOR_EMAIL: &str = "toomore0929@gmail.com";

// == Assemble ==
/// Builds the feed from a listing sorted newest first.
///
/// Details are fetched through the detail cache with bounded parallelism
/// and collected by input position, so item order follows `photos` no
/// matter which lookup finishes first. A photo whose detail cannot be
/// fetched is left out.
pub(super) async fn assemble(gallery: &Gallery, photos: &[Photo]) -> Feed {
    let site_url = gallery.site_url();
    let mut feed = Feed {
        title: FEED_TITLE.to_string(),
        link: format!("{}/", site_url),
        description: FEED_DESCRIPTION.to_string(),
        author: FeedAuthor {
            name: AUTHOR_NAME.to_string(),
            email: AUTHOR_EMAIL.to_string(),
        },
        updated: None,
        items: Vec::new(),
    };

    let newest = &photos[..photos.len().min(FEED_LIMIT)];
    if newest.is_empty() {
        return feed;
    }

    let semaphore = Semaphore::new(FEED_CONCURRENCY);
    let lookups = newest.iter().map(|photo| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.ok()?;
            match gallery.photo_detail(&photo.id).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(photo_id = photo.id.as_str(), "feed: detail skipped: {}", e);
                    None
                }
            }
        }
    });
    let details: Vec<Option<PhotoDetail>> = join_all(lookups).await;

    for (photo, detail) in newest.iter().zip(details) {
        let Some(detail) = detail else {
            continue;
        };
        let item = feed_item(site_url, photo, &detail);
        if feed.updated.is_none() {
            feed.updated = Some(item.updated);
        }
        feed.items.push(item);
    }

    debug!(items = feed.items.len(), "feed assembled");
    feed
}

fn feed_item(site_url: &str, photo: &Photo, detail: &PhotoDetail) -> FeedItem {
    let link = format!("{}/p/{}", site_url, photo.id);
    FeedItem {
        id: link.clone(),
        title: format!("{} ({})", photo.title, photo.id),
        description: describe(&link, detail),
        link,
        updated: detail.posted_at(),
    }
}

/// HTML snippet with the image, the caption and the credit line.
fn describe(link: &str, detail: &PhotoDetail) -> String {
    format!(
        r#"<a href="{}"><img src="{}"></a>{}<br>Photo by {}"#,
        link,
        detail.image_url("b"),
        detail.description.replace('\n', "<br>"),
        AUTHOR_NAME
    )
}

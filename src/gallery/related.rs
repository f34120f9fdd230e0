//! Related-photo selection.
//!
//! Mixes photos sharing the target's tags with a few from one curated tag
//! the target does not carry. The neighbouring tag is picked by hashing the
//! photo id, so a photo always offers the same neighbour.

use std::collections::HashSet;

use futures::future::join_all;
use rand::seq::SliceRandom;
use tracing::debug;

use super::Gallery;
use crate::models::Photo;

pub const MAX_RELATED: usize = 12;
pub const SAME_TAG_LIMIT: usize = 8;
pub const OTHER_TAG_LIMIT: usize = 4;

/// `h = h * 31 + c` over the id's chars, wrapping at 32 bits.
pub fn tag_hash(photo_id: &str) -> u32 {
    photo_id
        .chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

/// Curated tag the photo does not carry, chosen by [`tag_hash`].
pub fn pick_other_tag<'a>(
    photo_id: &str,
    tag_set: &'a [String],
    photo_tags: &[String],
) -> Option<&'a str> {
    let candidates: Vec<&str> = tag_set
        .iter()
        .filter(|tag| !photo_tags.contains(*tag))
        .map(String::as_str)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[tag_hash(photo_id) as usize % candidates.len()])
}

fn eligible(photo: &Photo, photo_id: &str) -> bool {
    photo.id != photo_id && photo.is_public
}

/// Union of per-tag results in tag order, first occurrence wins.
fn same_tag_pool(photo_id: &str, per_tag: Vec<Vec<Photo>>) -> Vec<Photo> {
    let mut seen = HashSet::new();
    per_tag
        .into_iter()
        .flatten()
        .filter(|photo| eligible(photo, photo_id))
        .filter(|photo| seen.insert(photo.id.clone()))
        .collect()
}

/// First [`OTHER_TAG_LIMIT`] photos not already offered.
fn other_tag_pool(photo_id: &str, photos: Vec<Photo>, seen: &HashSet<String>) -> Vec<Photo> {
    let mut taken = HashSet::new();
    photos
        .into_iter()
        .filter(|photo| eligible(photo, photo_id) && !seen.contains(&photo.id))
        .filter(|photo| taken.insert(photo.id.clone()))
        .take(OTHER_TAG_LIMIT)
        .collect()
}

// == Select ==
/// Builds the related set for one photo. Never fails: a tag whose search
/// fails contributes nothing.
pub(super) async fn select(gallery: &Gallery, photo_id: &str, tags: &[String]) -> Vec<Photo> {
    if tags.is_empty() {
        return Vec::new();
    }

    let searches = tags.iter().map(|tag| gallery.search_by_tag(tag));
    let per_tag: Vec<Vec<Photo>> = join_all(searches)
        .await
        .into_iter()
        .zip(tags)
        .filter_map(|(result, tag)| match result {
            Ok(photos) => Some(photos),
            Err(e) => {
                debug!(photo_id, tag = tag.as_str(), "related: tag search skipped: {}", e);
                None
            }
        })
        .collect();

    let mut same = same_tag_pool(photo_id, per_tag);
    same.shuffle(&mut rand::thread_rng());
    same.truncate(SAME_TAG_LIMIT);

    let mut other = Vec::new();
    if let Some(other_tag) = pick_other_tag(photo_id, gallery.tags(), tags) {
        match gallery.search_by_tag(other_tag).await {
            Ok(photos) => {
                let seen: HashSet<String> = same.iter().map(|p| p.id.clone()).collect();
                other = other_tag_pool(photo_id, photos, &seen);
            }
            Err(e) => debug!(photo_id, other_tag, "related: other tag search skipped: {}", e),
        }
    }

    let mut merged = same;
    merged.extend(other);
    merged.shuffle(&mut rand::thread_rng());
    merged.truncate(MAX_RELATED);
    merged
}

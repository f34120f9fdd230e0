//! Catalog Sync
//!
//! One-shot walk over every public photo of the account that refreshes the
//! durable store. Upstream calls are paced by a fixed-rate ticker.

use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::error::{GalleryError, Result};
use crate::gallery::fetch_dimensions;
use crate::storage::PhotoRepository;
use crate::upstream::{PhotoSource, SearchQuery};

/// Photos between two progress lines.
const PROGRESS_EVERY: usize = 50;

/// Outcome of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

// == Run Sync ==
/// Walks the catalog into `repository`.
///
/// Fails only when no repository is configured or it cannot be reached,
/// before any upstream call. A failed catalog listing is logged and yields
/// an empty report. A photo whose detail lookup or upsert fails is counted
/// and skipped.
pub async fn run_sync(
    source: &dyn PhotoSource,
    repository: Option<&dyn PhotoRepository>,
    rate_per_sec: u32,
) -> Result<SyncReport> {
    let repository = repository.ok_or_else(|| {
        GalleryError::Config("sync requires DATABASE_URL to be set".to_string())
    })?;
    repository.ping().await?;

    let listing = match source.search(&SearchQuery::everything()).await {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Sync: catalog listing failed: {}", e);
            return Ok(SyncReport::default());
        }
    };
    let photo_ids: Vec<String> = listing
        .into_iter()
        .filter(|photo| photo.is_public)
        .map(|photo| photo.id)
        .collect();
    info!("Sync: found {} public photos", photo_ids.len());

    let mut ticker = tokio::time::interval(tick_period(rate_per_sec));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut report = SyncReport {
        total: photo_ids.len(),
        ..SyncReport::default()
    };

    for (done, photo_id) in photo_ids.iter().enumerate() {
        ticker.tick().await;

        match sync_photo(source, repository, photo_id).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                warn!("Sync: skipped {}: {}", photo_id, e);
                report.failed += 1;
            }
        }

        if (done + 1) % PROGRESS_EVERY == 0 {
            info!("Sync: progress {}/{}", done + 1, report.total);
        }
    }

    info!(
        "Sync: finished, {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    Ok(report)
}

/// Spacing between upstream calls; never zero, which `interval` rejects.
fn tick_period(rate_per_sec: u32) -> Duration {
    (Duration::from_secs(1) / rate_per_sec.max(1)).max(Duration::from_nanos(1))
}

async fn sync_photo(
    source: &dyn PhotoSource,
    repository: &dyn PhotoRepository,
    photo_id: &str,
) -> Result<()> {
    let detail = source.photo_info(photo_id).await?;

    let (width, height) = match fetch_dimensions(source, photo_id).await {
        Ok(Some(dimensions)) => (dimensions.width, dimensions.height),
        Ok(None) => (0, 0),
        Err(e) => {
            warn!("Sync: no sizes for {}: {}", photo_id, e);
            (0, 0)
        }
    };

    repository
        .upsert_photo(photo_id, &detail, width, height)
        .await
}

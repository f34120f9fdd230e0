//! PostgreSQL photo repository.
//!
//! Detail records are kept as JSON text next to the columns listings sort
//! and filter on. Tags live in their own table so tag listings are an
//! indexed join.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::{PhotoRepository, StoredPhoto};
use crate::error::{GalleryError, Result};
use crate::models::{Photo, PhotoDetail};

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS photos (
        photo_id   TEXT PRIMARY KEY,
        info_json  TEXT NOT NULL,
        posted     BIGINT NOT NULL,
        width      BIGINT NOT NULL DEFAULT 0,
        height     BIGINT NOT NULL DEFAULT 0,
        fetched_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS photo_tags (
        photo_id TEXT NOT NULL REFERENCES photos(photo_id) ON DELETE CASCADE,
        tag      TEXT NOT NULL,
        PRIMARY KEY (photo_id, tag)
    )",
    "CREATE INDEX IF NOT EXISTS photo_tags_tag_idx ON photo_tags (tag)",
];

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Opens a pool and creates the tables if they are missing.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!("Storage: connected to PostgreSQL");

        Ok(Self { pool })
    }
}

#[async_trait]
impl PhotoRepository for PgRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn upsert_photo(
        &self,
        photo_id: &str,
        detail: &PhotoDetail,
        width: i64,
        height: i64,
    ) -> Result<()> {
        let info_json = serde_json::to_string(detail)
            .map_err(|e| GalleryError::Storage(format!("encode {}: {}", photo_id, e)))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO photos (photo_id, info_json, posted, width, height, fetched_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (photo_id) DO UPDATE SET
                info_json = EXCLUDED.info_json,
                posted = EXCLUDED.posted,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                fetched_at = EXCLUDED.fetched_at",
        )
        .bind(photo_id)
        .bind(&info_json)
        .bind(detail.posted)
        .bind(width)
        .bind(height)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM photo_tags WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await?;

        for tag in normalized_tags(&detail.tags) {
            sqlx::query(
                "INSERT INTO photo_tags (photo_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(photo_id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_photo(&self, photo_id: &str) -> Result<Option<StoredPhoto>> {
        let row: Option<(String, i64, i64)> =
            sqlx::query_as("SELECT info_json, width, height FROM photos WHERE photo_id = $1")
                .bind(photo_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(info_json, width, height)| {
            Ok(StoredPhoto {
                detail: decode_detail(&info_json)?,
                width,
                height,
            })
        })
        .transpose()
    }

    async fn photos_by_tag(&self, tag: &str) -> Result<Vec<Photo>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT p.info_json FROM photos p
             JOIN photo_tags t ON t.photo_id = p.photo_id
             WHERE t.tag = $1
             ORDER BY p.posted DESC, p.photo_id",
        )
        .bind(tag.trim().to_lowercase())
        .fetch_all(&self.pool)
        .await?;
        summaries(&rows)
    }

    async fn all_photos(&self) -> Result<Vec<Photo>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT info_json FROM photos ORDER BY posted DESC, photo_id")
                .fetch_all(&self.pool)
                .await?;
        summaries(&rows)
    }
}

fn summaries(rows: &[(String,)]) -> Result<Vec<Photo>> {
    rows.iter()
        .map(|(info_json,)| decode_detail(info_json).map(|detail| detail.summary()))
        .collect()
}

fn decode_detail(info_json: &str) -> Result<PhotoDetail> {
    serde_json::from_str(info_json)
        .map_err(|e| GalleryError::Storage(format!("corrupt photo record: {}", e)))
}

/// Lowercased, non-empty, first occurrence only.
fn normalized_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

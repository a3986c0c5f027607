//! Campaign database operations
//!
//! A campaign is one promoted release. `is_released` transitions false→true
//! exactly once, by the batch processor; a resolved track id, once stored,
//! is never overwritten with null.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Campaign record (one promoted release)
#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub artist: String,
    /// Calendar date, YYYY-MM-DD; no time-of-day semantics
    pub release_date: NaiveDate,
    pub upc: Option<String>,
    pub isrc: Option<String>,
    pub spotify_track_id: Option<String>,
    pub is_active: bool,
    pub is_released: bool,
}

impl Campaign {
    /// Create new campaign for a release
    pub fn new(slug: String, title: String, artist: String, release_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            title,
            artist,
            release_date,
            upc: None,
            isrc: None,
            spotify_track_id: None,
            is_active: true,
            is_released: false,
        }
    }
}

fn campaign_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Campaign> {
    let id_str: String = row.get("id");
    let date_str: String = row.get("release_date");

    Ok(Campaign {
        id: Uuid::parse_str(&id_str)?,
        slug: row.get("slug"),
        title: row.get("title"),
        artist: row.get("artist"),
        release_date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")?,
        upc: row.get("upc"),
        isrc: row.get("isrc"),
        spotify_track_id: row.get("spotify_track_id"),
        is_active: row.get::<i64, _>("is_active") != 0,
        is_released: row.get::<i64, _>("is_released") != 0,
    })
}

/// Save campaign to database
pub async fn insert_campaign(pool: &SqlitePool, campaign: &Campaign) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO campaigns (id, slug, title, artist, release_date, upc, isrc,
                               spotify_track_id, is_active, is_released, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(campaign.id.to_string())
    .bind(&campaign.slug)
    .bind(&campaign.title)
    .bind(&campaign.artist)
    .bind(campaign.release_date.format("%Y-%m-%d").to_string())
    .bind(&campaign.upc)
    .bind(&campaign.isrc)
    .bind(&campaign.spotify_track_id)
    .bind(campaign.is_active as i64)
    .bind(campaign.is_released as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load campaigns due for release-day processing
///
/// Eligible: active, not yet released, release date today or earlier.
/// The date comparison catches campaigns missed by a skipped run.
pub async fn due_campaigns(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Campaign>> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, title, artist, release_date, upc, isrc,
               spotify_track_id, is_active, is_released
        FROM campaigns
        WHERE is_active = 1 AND is_released = 0 AND release_date <= ?
        ORDER BY release_date, slug
        "#,
    )
    .bind(today.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(campaign_from_row).collect()
}

/// Load campaign by slug
pub async fn load_campaign_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Campaign>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, artist, release_date, upc, isrc,
               spotify_track_id, is_active, is_released
        FROM campaigns
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(campaign_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Persist a resolved track id so later runs skip the catalog lookup
pub async fn set_track_id(pool: &SqlitePool, campaign_id: Uuid, track_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE campaigns
        SET spotify_track_id = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(track_id)
    .bind(campaign_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark campaign as released (monotonic; never reverted)
pub async fn mark_released(pool: &SqlitePool, campaign_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE campaigns
        SET is_released = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(campaign_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

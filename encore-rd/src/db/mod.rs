//! Database access layer for encore-rd
//!
//! The release-day job reads and mutates two tables: `campaigns` (one row
//! per promoted release) and `subscribers` (one row per presave signup per
//! platform). Every mutation is a single-row, single-field update keyed by
//! primary key; no multi-row transactions are required.

pub mod campaigns;
pub mod subscribers;

use anyhow::Result;
use sqlx::SqlitePool;

/// Initialize encore-rd tables
///
/// Creates campaigns and subscribers tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            release_date TEXT NOT NULL,
            upc TEXT,
            isrc TEXT,
            spotify_track_id TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_released INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscribers (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL REFERENCES campaigns(id),
            email TEXT NOT NULL,
            platform TEXT NOT NULL,
            spotify_refresh_token TEXT,
            track_saved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(campaign_id, email, platform)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (campaigns, subscribers)");

    Ok(())
}

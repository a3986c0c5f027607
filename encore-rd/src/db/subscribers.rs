//! Subscriber database operations
//!
//! One row per (campaign, email, platform) presave signup. `track_saved`
//! is monotonic false→true: once set, the processor never touches the row
//! again, which makes a full run idempotent.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Streaming platform a subscriber presaved on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// OAuth platform with a programmatic library-save API
    Spotify,
    /// OAuth platform; library-save not yet implemented
    Deezer,
    AppleMusic,
    AmazonMusic,
    Youtube,
}

impl Platform {
    /// Parse the platform column; unknown values map to None
    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "spotify" => Some(Platform::Spotify),
            "deezer" => Some(Platform::Deezer),
            "apple" => Some(Platform::AppleMusic),
            "amazon" => Some(Platform::AmazonMusic),
            "youtube" => Some(Platform::Youtube),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::Deezer => "deezer",
            Platform::AppleMusic => "apple",
            Platform::AmazonMusic => "amazon",
            Platform::Youtube => "youtube",
        }
    }
}

/// Subscriber record (one presave signup on one platform)
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub email: String,
    /// Raw platform column; unknown platforms still flow through processing
    pub platform: String,
    /// Long-lived OAuth refresh token (OAuth-capable platforms only)
    pub spotify_refresh_token: Option<String>,
    pub track_saved: bool,
}

impl Subscriber {
    /// Create new subscriber for a campaign
    pub fn new(campaign_id: Uuid, email: String, platform: Platform) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            email,
            platform: platform.as_str().to_string(),
            spotify_refresh_token: None,
            track_saved: false,
        }
    }
}

/// Save subscriber to database
pub async fn insert_subscriber(pool: &SqlitePool, subscriber: &Subscriber) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, campaign_id, email, platform,
                                 spotify_refresh_token, track_saved, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(subscriber.id.to_string())
    .bind(subscriber.campaign_id.to_string())
    .bind(&subscriber.email)
    .bind(&subscriber.platform)
    .bind(&subscriber.spotify_refresh_token)
    .bind(subscriber.track_saved as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load subscribers of a campaign still awaiting processing
pub async fn pending_for_campaign(pool: &SqlitePool, campaign_id: Uuid) -> Result<Vec<Subscriber>> {
    let rows = sqlx::query(
        r#"
        SELECT id, campaign_id, email, platform, spotify_refresh_token, track_saved
        FROM subscribers
        WHERE campaign_id = ? AND track_saved = 0
        ORDER BY rowid
        "#,
    )
    .bind(campaign_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let id_str: String = row.get("id");
            let campaign_str: String = row.get("campaign_id");

            Ok(Subscriber {
                id: Uuid::parse_str(&id_str)?,
                campaign_id: Uuid::parse_str(&campaign_str)?,
                email: row.get("email"),
                platform: row.get("platform"),
                spotify_refresh_token: row.get("spotify_refresh_token"),
                track_saved: row.get::<i64, _>("track_saved") != 0,
            })
        })
        .collect()
}

/// Mark a subscriber's track as saved (monotonic; never reverted)
pub async fn mark_track_saved(pool: &SqlitePool, subscriber_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE subscribers
        SET track_saved = 1, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(subscriber_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

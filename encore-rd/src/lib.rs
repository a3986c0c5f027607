//! encore-rd library - Release Day module
//!
//! Processes presave campaigns whose release date has arrived: resolves the
//! streaming-platform track id from catalog identifiers (UPC/ISRC), then
//! replays each subscriber's stored refresh token to push the track into
//! their library. Triggered by an external scheduler over HTTP.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use axum::Router;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};
use crate::services::StreamingPlatform;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Streaming platform client (Spotify in production, a double in tests)
    pub platform: Arc<dyn StreamingPlatform>,
    /// Shared secret required on scheduled-trigger requests (None disables)
    pub cron_secret: Option<String>,
    /// Whether the cron secret is enforced (production) or advisory (dev)
    pub production: bool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        platform: Arc<dyn StreamingPlatform>,
        cron_secret: Option<String>,
        production: bool,
    ) -> Self {
        Self {
            db,
            platform,
            cron_secret,
            production,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// The trigger route accepts both GET (scheduler) and POST (manual runs).
/// `/health` requires no authorization.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route(
            "/api/cron/release-day",
            get(api::trigger_release_day).post(api::trigger_release_day),
        )
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

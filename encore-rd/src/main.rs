//! encore-rd (Release Day) - Presave campaign processor
//!
//! Runs the daily release-day job for presave campaigns:
//! 1. Finds campaigns that released today (or earlier, if a run was missed)
//! 2. Looks up the Spotify track id by ISRC/UPC/title
//! 3. Uses stored refresh tokens to save the track to subscriber libraries
//!
//! The job is invoked by an external scheduler hitting
//! `/api/cron/release-day` with a bearer secret.

use anyhow::Result;
use encore_rd::services::SpotifyClient;
use encore_rd::{build_router, AppState};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Encore Release Day (encore-rd) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = encore_common::Config::load()?;
    info!("Database path: {}", config.database_path.display());

    if config.spotify_client_id.is_empty() || config.spotify_client_secret.is_empty() {
        warn!("Spotify client credentials not configured; track resolution and library saves will fail");
    }
    if config.cron_secret.is_none() {
        warn!("CRON_SECRET not configured; trigger endpoint is unauthenticated");
    }

    let pool = encore_common::db::connect_pool(&config.database_path).await?;
    encore_rd::db::init_tables(&pool).await?;
    info!("✓ Database connection established");

    let spotify = SpotifyClient::new(
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    )?;

    let state = AppState::new(
        pool,
        Arc::new(spotify),
        config.cron_secret.clone(),
        config.production,
    );
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("encore-rd listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

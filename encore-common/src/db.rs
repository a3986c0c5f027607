//! Shared SQLite pool setup for Encore services

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the service database and return a connection pool
pub async fn connect_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    Ok(pool)
}

//! Configuration loading for Encore services
//!
//! Settings resolve in priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! The config file is looked up at `$ENCORE_CONFIG`, then
//! `~/.config/encore/config.toml`, then `/etc/encore/config.toml`.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Spotify application client id (client-credentials and refresh grants)
    pub spotify_client_id: String,
    /// Spotify application client secret
    pub spotify_client_secret: String,
    /// Shared secret required on scheduled-trigger requests.
    /// None disables the check entirely.
    pub cron_secret: Option<String>,
    /// Production deployments enforce the cron secret; elsewhere a missing
    /// or wrong secret is tolerated for manual triggers.
    pub production: bool,
}

/// Optional fields as they appear in the TOML config file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    database_path: Option<PathBuf>,
    spotify_client_id: Option<String>,
    spotify_client_secret: Option<String>,
    cron_secret: Option<String>,
    production: Option<bool>,
}

impl Config {
    /// Load configuration from config file and environment
    pub fn load() -> Result<Config> {
        let file = load_config_file()?;

        let host = env_or("ENCORE_HOST", file.host, || "127.0.0.1".to_string());
        let port = match std::env::var("ENCORE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("Invalid ENCORE_PORT: {}", e)))?,
            Err(_) => file.port.unwrap_or(5740),
        };
        let database_path = std::env::var("ENCORE_DB")
            .map(PathBuf::from)
            .ok()
            .or(file.database_path)
            .unwrap_or_else(default_database_path);

        let spotify_client_id = env_or("SPOTIFY_CLIENT_ID", file.spotify_client_id, String::new);
        let spotify_client_secret =
            env_or("SPOTIFY_CLIENT_SECRET", file.spotify_client_secret, String::new);

        let cron_secret = std::env::var("CRON_SECRET")
            .ok()
            .or(file.cron_secret)
            .filter(|s| !s.is_empty());

        let production = match std::env::var("ENCORE_ENV") {
            Ok(value) => value == "production",
            Err(_) => file.production.unwrap_or(false),
        };

        Ok(Config {
            host,
            port,
            database_path,
            spotify_client_id,
            spotify_client_secret,
            cron_secret,
            production,
        })
    }
}

fn env_or(name: &str, file_value: Option<String>, default: impl FnOnce() -> String) -> String {
    std::env::var(name)
        .ok()
        .or(file_value)
        .unwrap_or_else(default)
}

/// Parse the config file if one exists; absent file is not an error
fn load_config_file() -> Result<FileConfig> {
    let path = match config_file_path() {
        Some(path) => path,
        None => return Ok(FileConfig::default()),
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Locate the config file, if any
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ENCORE_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("encore").join("config.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/encore/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("encore").join("encore.db"))
        .unwrap_or_else(|| PathBuf::from("./encore.db"))
}

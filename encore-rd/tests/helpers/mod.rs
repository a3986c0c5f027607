//! Test helpers: in-memory database setup and a scripted platform double
#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Mutex;

use encore_rd::services::{PlatformError, StreamingPlatform};

/// Fresh in-memory database with encore-rd tables
pub async fn memory_pool() -> SqlitePool {
    // Single connection: each sqlite::memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool should open");

    encore_rd::db::init_tables(&pool)
        .await
        .expect("tables should initialize");

    pool
}

/// Scripted stand-in for the Spotify client.
///
/// Each search tier returns a fixed result; refresh tokens resolve through
/// a map (missing entry = failed exchange). Every call is recorded so tests
/// can assert which tiers ran.
pub struct ScriptedPlatform {
    /// Fail the client-credentials grant (aborts resolution)
    pub fail_client_token: bool,
    pub isrc_result: Option<String>,
    pub upc_album: Option<String>,
    pub album_first_track: Option<String>,
    pub title_result: Option<String>,
    /// refresh token -> access token; tokens absent from the map fail
    pub access_tokens: HashMap<String, String>,
    /// Whether library saves succeed
    pub save_ok: bool,
    pub calls: Mutex<Vec<String>>,
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self {
            fail_client_token: false,
            isrc_result: None,
            upc_album: None,
            album_first_track: None,
            title_result: None,
            access_tokens: HashMap::new(),
            save_ok: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPlatform {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamingPlatform for ScriptedPlatform {
    async fn client_credentials_token(&self) -> Result<String, PlatformError> {
        self.record("client_token".to_string());
        if self.fail_client_token {
            Err(PlatformError::Auth(401))
        } else {
            Ok("machine-token".to_string())
        }
    }

    async fn search_track_by_isrc(
        &self,
        _access_token: &str,
        isrc: &str,
    ) -> Result<Option<String>, PlatformError> {
        self.record(format!("isrc:{}", isrc));
        Ok(self.isrc_result.clone())
    }

    async fn search_album_by_upc(
        &self,
        _access_token: &str,
        upc: &str,
    ) -> Result<Option<String>, PlatformError> {
        self.record(format!("upc:{}", upc));
        Ok(self.upc_album.clone())
    }

    async fn first_album_track(
        &self,
        _access_token: &str,
        album_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        self.record(format!("album_tracks:{}", album_id));
        Ok(self.album_first_track.clone())
    }

    async fn search_track_by_title(
        &self,
        _access_token: &str,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, PlatformError> {
        self.record(format!("title:{} artist:{}", title, artist));
        Ok(self.title_result.clone())
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Option<String> {
        self.record(format!("refresh:{}", refresh_token));
        self.access_tokens.get(refresh_token).cloned()
    }

    async fn save_track(&self, access_token: &str, track_id: &str) -> bool {
        self.record(format!("save:{}:{}", access_token, track_id));
        self.save_ok
    }
}

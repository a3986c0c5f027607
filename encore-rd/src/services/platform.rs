//! Streaming platform seam
//!
//! The resolver and batch processor talk to the streaming platform only
//! through this trait, so tests can substitute scripted doubles for the
//! live Spotify Web API.

use async_trait::async_trait;
use thiserror::Error;

/// Streaming platform client errors
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Token request rejected with status {0}")]
    Auth(u16),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Low-level streaming platform operations used by the release-day job.
///
/// Search calls take an explicit access token so one client-credentials
/// token can be shared across the tiers of a single resolution.
#[async_trait]
pub trait StreamingPlatform: Send + Sync {
    /// Fetch a machine token via the client-credentials grant (not tied to
    /// any user; catalog search only)
    async fn client_credentials_token(&self) -> Result<String, PlatformError>;

    /// Search tracks by ISRC; first hit's track id
    async fn search_track_by_isrc(
        &self,
        access_token: &str,
        isrc: &str,
    ) -> Result<Option<String>, PlatformError>;

    /// Search albums by UPC; first hit's album id
    async fn search_album_by_upc(
        &self,
        access_token: &str,
        upc: &str,
    ) -> Result<Option<String>, PlatformError>;

    /// First track of an album, in track-listing order
    async fn first_album_track(
        &self,
        access_token: &str,
        album_id: &str,
    ) -> Result<Option<String>, PlatformError>;

    /// Search tracks by exact title + artist text query; first hit's id
    async fn search_track_by_title(
        &self,
        access_token: &str,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, PlatformError>;

    /// Exchange a refresh token for a short-lived access token.
    ///
    /// Returns None on any non-success status or transport error; never
    /// errors to the caller. The caller treats None as "skip this
    /// subscriber, do not mark saved".
    async fn refresh_access_token(&self, refresh_token: &str) -> Option<String>;

    /// Add a track to the user's library. True only on a success status.
    ///
    /// Re-adding an already-saved track is a no-op on the platform side,
    /// so at-least-once delivery from the processor is acceptable.
    async fn save_track(&self, access_token: &str, track_id: &str) -> bool;
}

//! Spotify Web API client
//!
//! Implements the [`StreamingPlatform`] seam against the public Spotify
//! endpoints: token grants at `accounts.spotify.com` (client id/secret via
//! HTTP basic auth), catalog search and library writes at
//! `api.spotify.com` (bearer token).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::platform::{PlatformError, StreamingPlatform};

const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
const API_BASE_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("encore-rd/", env!("CARGO_PKG_VERSION"));

// Bounded per-call timeout so one hung dependency cannot stall a whole run
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Token endpoint response (client-credentials and refresh grants)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TrackSearchResponse {
    tracks: Option<Page>,
}

#[derive(Debug, Deserialize)]
struct AlbumSearchResponse {
    albums: Option<Page>,
}

/// Paged item list; only the ids are used
#[derive(Debug, Deserialize)]
struct Page {
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AlbumTracksResponse {
    items: Vec<Item>,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl SpotifyClient {
    pub fn new(client_id: String, client_secret: String) -> Result<Self, PlatformError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            client_id,
            client_secret,
        })
    }

    /// POST to the token endpoint with client basic auth
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<String, PlatformError> {
        let response = self
            .http_client
            .post(format!("{}/api/token", ACCOUNTS_BASE_URL))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Auth(status.as_u16()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        Ok(token.access_token)
    }

    /// GET a catalog search with one query string, limit 1
    async fn search(
        &self,
        access_token: &str,
        query: &str,
        kind: &str,
    ) -> Result<reqwest::Response, PlatformError> {
        let response = self
            .http_client
            .get(format!("{}/search", API_BASE_URL))
            .bearer_auth(access_token)
            .query(&[("q", query), ("type", kind), ("limit", "1")])
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api(status.as_u16(), body));
        }

        Ok(response)
    }
}

#[async_trait]
impl StreamingPlatform for SpotifyClient {
    async fn client_credentials_token(&self) -> Result<String, PlatformError> {
        self.token_request(&[("grant_type", "client_credentials")])
            .await
    }

    async fn search_track_by_isrc(
        &self,
        access_token: &str,
        isrc: &str,
    ) -> Result<Option<String>, PlatformError> {
        let response = self
            .search(access_token, &format!("isrc:{}", isrc), "track")
            .await?;

        let data: TrackSearchResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        Ok(data
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.id))
    }

    async fn search_album_by_upc(
        &self,
        access_token: &str,
        upc: &str,
    ) -> Result<Option<String>, PlatformError> {
        let response = self
            .search(access_token, &format!("upc:{}", upc), "album")
            .await?;

        let data: AlbumSearchResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        Ok(data
            .albums
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.id))
    }

    async fn first_album_track(
        &self,
        access_token: &str,
        album_id: &str,
    ) -> Result<Option<String>, PlatformError> {
        let response = self
            .http_client
            .get(format!("{}/albums/{}/tracks", API_BASE_URL, album_id))
            .bearer_auth(access_token)
            .query(&[("limit", "1")])
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api(status.as_u16(), body));
        }

        let data: AlbumTracksResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        Ok(data.items.into_iter().next().map(|item| item.id))
    }

    async fn search_track_by_title(
        &self,
        access_token: &str,
        title: &str,
        artist: &str,
    ) -> Result<Option<String>, PlatformError> {
        let query = format!("track:{} artist:{}", title, artist);
        let response = self.search(access_token, &query, "track").await?;

        let data: TrackSearchResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(e.to_string()))?;

        Ok(data
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.id))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Option<String> {
        match self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
        {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh Spotify token");
                None
            }
        }
    }

    async fn save_track(&self, access_token: &str, track_id: &str) -> bool {
        let result = self
            .http_client
            .put(format!("{}/me/tracks", API_BASE_URL))
            .bearer_auth(access_token)
            .query(&[("ids", track_id)])
            .send()
            .await;

        match result {
            Ok(response) => {
                let ok = response.status().is_success();
                if !ok {
                    tracing::warn!(
                        status = response.status().as_u16(),
                        track_id = %track_id,
                        "Spotify library save rejected"
                    );
                }
                ok
            }
            Err(e) => {
                tracing::warn!(error = %e, "Spotify library save request failed");
                false
            }
        }
    }
}

//! Catalog identifier resolver
//!
//! Maps a release's catalog identifiers (UPC/ISRC) to a platform track id
//! via a three-tier fallback search. First match wins; a tier is attempted
//! only when the prior tier yields nothing:
//!
//! 1. ISRC track search (most reliable)
//! 2. UPC album search, then first track of the first album
//! 3. Title + artist text search
//!
//! "Not found" is not an error: the function returns None and the campaign
//! is retried on the next run. Only the machine-credential fetch aborts a
//! resolution, and that too is reported as None after logging.

use tracing::{debug, warn};

use super::platform::StreamingPlatform;

/// Resolve a platform track id from catalog metadata
pub async fn resolve_track_id(
    platform: &dyn StreamingPlatform,
    upc: Option<&str>,
    isrc: Option<&str>,
    title: &str,
    artist: &str,
) -> Option<String> {
    // One machine token shared by every tier of this resolution
    let token = match platform.client_credentials_token().await {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "Failed to get client credentials token; skipping resolution");
            return None;
        }
    };

    // Tier 1: ISRC
    if let Some(isrc) = isrc {
        match platform.search_track_by_isrc(&token, isrc).await {
            Ok(Some(track_id)) => {
                debug!(isrc = %isrc, track_id = %track_id, "Resolved track by ISRC");
                return Some(track_id);
            }
            Ok(None) => debug!(isrc = %isrc, "No track found by ISRC"),
            Err(e) => warn!(isrc = %isrc, error = %e, "ISRC search failed"),
        }
    }

    // Tier 2: UPC → album → first track
    if let Some(upc) = upc {
        match platform.search_album_by_upc(&token, upc).await {
            Ok(Some(album_id)) => match platform.first_album_track(&token, &album_id).await {
                Ok(Some(track_id)) => {
                    debug!(upc = %upc, track_id = %track_id, "Resolved track by UPC");
                    return Some(track_id);
                }
                Ok(None) => debug!(upc = %upc, album_id = %album_id, "Album has no tracks"),
                Err(e) => warn!(upc = %upc, error = %e, "Album track listing failed"),
            },
            Ok(None) => debug!(upc = %upc, "No album found by UPC"),
            Err(e) => warn!(upc = %upc, error = %e, "UPC search failed"),
        }
    }

    // Tier 3: title + artist text search
    match platform.search_track_by_title(&token, title, artist).await {
        Ok(Some(track_id)) => {
            debug!(title = %title, artist = %artist, track_id = %track_id, "Resolved track by title search");
            Some(track_id)
        }
        Ok(None) => {
            debug!(title = %title, artist = %artist, "No track found by title search");
            None
        }
        Err(e) => {
            warn!(title = %title, error = %e, "Title search failed");
            None
        }
    }
}

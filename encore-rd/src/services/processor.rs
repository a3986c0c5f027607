//! Campaign batch processor
//!
//! Drives one full run of the release-day job:
//! 1. Select campaigns due for release (active, unreleased, date arrived)
//! 2. Resolve the platform track id if not already cached
//! 3. For each pending subscriber, replay the stored refresh token and
//!    save the track to their library
//! 4. Mark the campaign released
//!
//! Per-item failures are collected into the run summary rather than
//! propagated: one subscriber's bad token never aborts the batch, and one
//! campaign's storage failure never blocks the others. Only a failure to
//! read the campaign list itself errors out of the run.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::db::subscribers::Platform;
use crate::db::{campaigns, subscribers};

use super::platform::StreamingPlatform;
use super::resolver::resolve_track_id;

/// Aggregate result of one release-day run
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub processed_campaigns: u32,
    pub processed_users: u32,
    pub tracks_saved: u32,
    pub errors: Vec<String>,
}

/// Run the release-day job once
///
/// Strictly sequential: subscribers of a campaign are processed one at a
/// time, campaigns one after another. Overlapping runs are not guarded
/// here; the scheduler is expected to serialize triggers.
pub async fn run_release_day(
    pool: &SqlitePool,
    platform: &dyn StreamingPlatform,
) -> Result<RunSummary> {
    let today = Utc::now().date_naive();
    let mut summary = RunSummary::default();

    info!("=== Release day run started ({}) ===", today);

    let due = campaigns::due_campaigns(pool, today).await?;

    if due.is_empty() {
        info!("No campaigns to process today");
        return Ok(summary);
    }

    info!("Found {} campaign(s) to process", due.len());

    for campaign in due {
        info!(slug = %campaign.slug, title = %campaign.title, "Processing campaign");
        summary.processed_campaigns += 1;

        let mut track_id = campaign.spotify_track_id.clone();

        // Resolve the track id once per campaign and cache it immediately,
        // so a mid-run failure does not re-spend the lookup next time
        if track_id.is_none() && (campaign.upc.is_some() || campaign.isrc.is_some()) {
            debug!(
                upc = campaign.upc.as_deref().unwrap_or("-"),
                isrc = campaign.isrc.as_deref().unwrap_or("-"),
                "Looking up Spotify track id"
            );

            match resolve_track_id(
                platform,
                campaign.upc.as_deref(),
                campaign.isrc.as_deref(),
                &campaign.title,
                &campaign.artist,
            )
            .await
            {
                Some(id) => {
                    info!(track_id = %id, "Found Spotify track id");
                    if let Err(e) = campaigns::set_track_id(pool, campaign.id, &id).await {
                        error!(slug = %campaign.slug, error = %e, "Failed to store resolved track id");
                        summary
                            .errors
                            .push(format!("Failed to store track id for: {}", campaign.title));
                        // Storage trouble: abandon this campaign for now,
                        // it stays eligible for the next run
                        continue;
                    }
                    track_id = Some(id);
                }
                None => {
                    // Maybe it's not on Spotify yet; non-OAuth subscribers
                    // can still be processed below
                    warn!(slug = %campaign.slug, "Could not find Spotify track id");
                    summary
                        .errors
                        .push(format!("No Spotify ID found for: {}", campaign.title));
                }
            }
        }

        let pending = match subscribers::pending_for_campaign(pool, campaign.id).await {
            Ok(pending) => pending,
            Err(e) => {
                error!(slug = %campaign.slug, error = %e, "Failed to fetch subscribers");
                summary
                    .errors
                    .push(format!("Failed to fetch users for: {}", campaign.title));
                continue;
            }
        };

        if pending.is_empty() {
            info!(slug = %campaign.slug, "No subscribers to process");
        } else {
            info!(
                slug = %campaign.slug,
                count = pending.len(),
                "Processing subscribers"
            );
        }

        for subscriber in &pending {
            summary.processed_users += 1;

            match Platform::parse(&subscriber.platform) {
                Some(Platform::Spotify) => {
                    // Needs both a resolved track and a stored credential;
                    // otherwise leave the row pending for a later run
                    let (Some(track), Some(refresh_token)) = (
                        track_id.as_deref(),
                        subscriber.spotify_refresh_token.as_deref(),
                    ) else {
                        debug!(
                            email = %subscriber.email,
                            "Skipping Spotify subscriber (missing track id or refresh token)"
                        );
                        continue;
                    };

                    let Some(access_token) = platform.refresh_access_token(refresh_token).await
                    else {
                        summary
                            .errors
                            .push(format!("Failed to save for: {}", subscriber.email));
                        continue;
                    };

                    if platform.save_track(&access_token, track).await {
                        summary.tracks_saved += 1;
                        info!(email = %subscriber.email, "✓ Saved track to Spotify library");
                        if let Err(e) = subscribers::mark_track_saved(pool, subscriber.id).await {
                            error!(email = %subscriber.email, error = %e, "Failed to record save");
                            summary
                                .errors
                                .push(format!("Failed to record save for: {}", subscriber.email));
                        }
                    } else {
                        summary
                            .errors
                            .push(format!("Failed to save for: {}", subscriber.email));
                    }
                }
                Some(Platform::Deezer) => {
                    // Library-save path not implemented for Deezer yet;
                    // leave the row pending, not an error
                    debug!(email = %subscriber.email, "Deezer save not yet implemented, skipping");
                }
                _ => {
                    // No programmatic library-add exists for this platform;
                    // mark processed so the row is never revisited. Any
                    // actual delivery is the email notifier's job.
                    if let Err(e) = subscribers::mark_track_saved(pool, subscriber.id).await {
                        error!(email = %subscriber.email, error = %e, "Failed to mark subscriber processed");
                        summary
                            .errors
                            .push(format!("Failed to record save for: {}", subscriber.email));
                    }
                }
            }
        }

        // Mark released regardless of individual subscriber outcomes:
        // failed subscribers stay pending, but the campaign itself is done
        match campaigns::mark_released(pool, campaign.id).await {
            Ok(()) => info!(slug = %campaign.slug, "✓ Campaign marked as released"),
            Err(e) => {
                error!(slug = %campaign.slug, error = %e, "Failed to mark campaign released");
                summary
                    .errors
                    .push(format!("Failed to mark released: {}", campaign.title));
            }
        }
    }

    info!(
        campaigns = summary.processed_campaigns,
        users = summary.processed_users,
        saved = summary.tracks_saved,
        errors = summary.errors.len(),
        "=== Release day run complete ==="
    );

    Ok(summary)
}

//! Release-day processor and resolver behavior
//!
//! Covers the batch state machine end to end against an in-memory
//! database and a scripted platform double: run idempotence, resolver
//! tier order and fallback, per-platform subscriber dispatch, and
//! failure isolation.

mod helpers;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use encore_rd::db::campaigns::{self, Campaign};
use encore_rd::db::subscribers::{self, Platform, Subscriber};
use encore_rd::services::{resolve_track_id, run_release_day};
use helpers::{memory_pool, ScriptedPlatform};

fn yesterday() -> chrono::NaiveDate {
    Utc::now().date_naive() - Duration::days(1)
}

async fn insert_due_campaign(pool: &SqlitePool, slug: &str) -> Campaign {
    let campaign = Campaign::new(
        slug.to_string(),
        "Test Single".to_string(),
        "Test Artist".to_string(),
        yesterday(),
    );
    campaigns::insert_campaign(pool, &campaign)
        .await
        .expect("campaign insert");
    campaign
}

async fn insert_spotify_subscriber(
    pool: &SqlitePool,
    campaign_id: Uuid,
    email: &str,
    refresh_token: Option<&str>,
) -> Subscriber {
    let mut subscriber = Subscriber::new(campaign_id, email.to_string(), Platform::Spotify);
    subscriber.spotify_refresh_token = refresh_token.map(String::from);
    subscribers::insert_subscriber(pool, &subscriber)
        .await
        .expect("subscriber insert");
    subscriber
}

async fn track_saved(pool: &SqlitePool, email: &str) -> bool {
    let saved: i64 = sqlx::query_scalar("SELECT track_saved FROM subscribers WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("subscriber lookup");
    saved != 0
}

// =============================================================================
// Resolver tier behavior
// =============================================================================

#[tokio::test]
async fn test_resolver_isrc_hit_skips_upc() {
    let platform = ScriptedPlatform {
        isrc_result: Some("trk_isrc".to_string()),
        upc_album: Some("alb_1".to_string()),
        album_first_track: Some("trk_upc".to_string()),
        ..Default::default()
    };

    let resolved = resolve_track_id(
        &platform,
        Some("000111222333"),
        Some("USX9P2400001"),
        "Test Single",
        "Test Artist",
    )
    .await;

    assert_eq!(resolved.as_deref(), Some("trk_isrc"));

    // The UPC tier must never run once ISRC matched
    let calls = platform.recorded_calls();
    assert!(calls.iter().any(|c| c.starts_with("isrc:")));
    assert!(!calls.iter().any(|c| c.starts_with("upc:")));
    assert!(!calls.iter().any(|c| c.starts_with("title:")));
}

#[tokio::test]
async fn test_resolver_falls_back_to_title_search() {
    let platform = ScriptedPlatform {
        title_result: Some("trk_title".to_string()),
        ..Default::default()
    };

    let resolved = resolve_track_id(
        &platform,
        Some("000111222333"),
        Some("USX9P2400001"),
        "Test Single",
        "Test Artist",
    )
    .await;

    assert_eq!(resolved.as_deref(), Some("trk_title"));

    // Both identifier tiers were attempted first
    let calls = platform.recorded_calls();
    assert!(calls.iter().any(|c| c.starts_with("isrc:")));
    assert!(calls.iter().any(|c| c.starts_with("upc:")));
    assert!(calls.iter().any(|c| c.starts_with("title:")));
}

#[tokio::test]
async fn test_resolver_credential_failure_returns_none() {
    let platform = ScriptedPlatform {
        fail_client_token: true,
        isrc_result: Some("trk_isrc".to_string()),
        ..Default::default()
    };

    let resolved = resolve_track_id(
        &platform,
        None,
        Some("USX9P2400001"),
        "Test Single",
        "Test Artist",
    )
    .await;

    assert!(resolved.is_none());
    // No search ran after the credential step failed
    assert_eq!(platform.recorded_calls(), vec!["client_token".to_string()]);
}

// =============================================================================
// Batch processor
// =============================================================================

#[tokio::test]
async fn test_end_to_end_upc_tier_save() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        upc: Some("000111222333".to_string()),
        ..Campaign::new(
            "x".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();
    insert_spotify_subscriber(&pool, campaign.id, "fan@example.com", Some("rt_valid")).await;

    let platform = ScriptedPlatform {
        upc_album: Some("alb_1".to_string()),
        album_first_track: Some("trk_abc".to_string()),
        access_tokens: [("rt_valid".to_string(), "tok_xyz".to_string())].into(),
        ..Default::default()
    };

    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_campaigns, 1);
    assert_eq!(summary.processed_users, 1);
    assert_eq!(summary.tracks_saved, 1);
    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);

    let stored = campaigns::load_campaign_by_slug(&pool, "x")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.spotify_track_id.as_deref(), Some("trk_abc"));
    assert!(stored.is_released);
    assert!(track_saved(&pool, "fan@example.com").await);

    // The save used the exchanged access token and the resolved track
    assert!(platform
        .recorded_calls()
        .contains(&"save:tok_xyz:trk_abc".to_string()));
}

#[tokio::test]
async fn test_second_run_processes_nothing() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        isrc: Some("USX9P2400001".to_string()),
        ..Campaign::new(
            "once".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();
    insert_spotify_subscriber(&pool, campaign.id, "fan@example.com", Some("rt_valid")).await;

    let platform = ScriptedPlatform {
        isrc_result: Some("trk_abc".to_string()),
        access_tokens: [("rt_valid".to_string(), "tok_xyz".to_string())].into(),
        ..Default::default()
    };

    let first = run_release_day(&pool, &platform).await.unwrap();
    assert_eq!(first.processed_campaigns, 1);
    assert!(first.errors.is_empty());

    let second = run_release_day(&pool, &platform).await.unwrap();
    assert_eq!(second.processed_campaigns, 0);
    assert_eq!(second.processed_users, 0);
    assert_eq!(second.tracks_saved, 0);
}

#[tokio::test]
async fn test_spotify_subscriber_without_credential_left_pending() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        spotify_track_id: Some("trk_abc".to_string()),
        ..Campaign::new(
            "nocred".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();
    insert_spotify_subscriber(&pool, campaign.id, "fan@example.com", None).await;

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_users, 1);
    assert_eq!(summary.tracks_saved, 0);
    assert!(summary.errors.is_empty());
    assert!(!track_saved(&pool, "fan@example.com").await);

    // Campaign completes even though the subscriber stays pending
    let stored = campaigns::load_campaign_by_slug(&pool, "nocred")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_released);
}

#[tokio::test]
async fn test_non_oauth_platform_marked_processed_without_network() {
    let pool = memory_pool().await;
    let campaign = insert_due_campaign(&pool, "linkonly").await;

    let subscriber = Subscriber::new(
        campaign.id,
        "fan@example.com".to_string(),
        Platform::AppleMusic,
    );
    subscribers::insert_subscriber(&pool, &subscriber)
        .await
        .unwrap();

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_users, 1);
    assert_eq!(summary.tracks_saved, 0);
    assert!(summary.errors.is_empty());
    assert!(track_saved(&pool, "fan@example.com").await);

    // No campaign identifiers, no OAuth subscribers: zero platform calls
    assert!(platform.recorded_calls().is_empty());
}

#[tokio::test]
async fn test_deezer_subscriber_skipped_without_error() {
    let pool = memory_pool().await;
    let campaign = insert_due_campaign(&pool, "deezer").await;

    let subscriber = Subscriber::new(campaign.id, "fan@example.com".to_string(), Platform::Deezer);
    subscribers::insert_subscriber(&pool, &subscriber)
        .await
        .unwrap();

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_users, 1);
    assert!(summary.errors.is_empty());
    assert!(!track_saved(&pool, "fan@example.com").await);
}

#[tokio::test]
async fn test_failure_isolation_across_subscribers() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        spotify_track_id: Some("trk_abc".to_string()),
        ..Campaign::new(
            "isolation".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();

    insert_spotify_subscriber(&pool, campaign.id, "first@example.com", Some("rt_1")).await;
    // Second subscriber's token exchange is rigged to fail
    insert_spotify_subscriber(&pool, campaign.id, "second@example.com", Some("rt_bad")).await;
    insert_spotify_subscriber(&pool, campaign.id, "third@example.com", Some("rt_3")).await;

    let platform = ScriptedPlatform {
        access_tokens: [
            ("rt_1".to_string(), "tok_1".to_string()),
            ("rt_3".to_string(), "tok_3".to_string()),
        ]
        .into(),
        ..Default::default()
    };

    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_users, 3);
    assert_eq!(summary.tracks_saved, 2);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("second@example.com"));

    assert!(track_saved(&pool, "first@example.com").await);
    assert!(!track_saved(&pool, "second@example.com").await);
    assert!(track_saved(&pool, "third@example.com").await);
}

#[tokio::test]
async fn test_unresolved_campaign_records_error_and_still_completes() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        isrc: Some("USX9P2400001".to_string()),
        ..Campaign::new(
            "unresolved".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();
    insert_spotify_subscriber(&pool, campaign.id, "fan@example.com", Some("rt_valid")).await;

    // No tier matches anywhere
    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_campaigns, 1);
    assert_eq!(summary.tracks_saved, 0);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains("No Spotify ID found"));

    // Spotify subscriber skipped (no track id); campaign still completes
    assert!(!track_saved(&pool, "fan@example.com").await);
    let stored = campaigns::load_campaign_by_slug(&pool, "unresolved")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_released);
    assert!(stored.spotify_track_id.is_none());
}

#[tokio::test]
async fn test_subscriber_fetch_failure_abandons_campaign_without_release() {
    let pool = memory_pool().await;
    insert_due_campaign(&pool, "storage-a").await;
    insert_due_campaign(&pool, "storage-b").await;

    // Break subscriber reads to simulate campaign-level storage failure
    sqlx::query("ALTER TABLE subscribers RENAME TO subscribers_offline")
        .execute(&pool)
        .await
        .unwrap();

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    // One campaign's storage failure never blocks the others: both were
    // attempted, each recorded exactly one error
    assert_eq!(summary.processed_campaigns, 2);
    assert_eq!(summary.processed_users, 0);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary
        .errors
        .iter()
        .all(|e| e.contains("Failed to fetch users")));

    // Abandoned campaigns stay unreleased and eligible for the next run
    for slug in ["storage-a", "storage-b"] {
        let stored = campaigns::load_campaign_by_slug(&pool, slug)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_released);
    }
}

#[tokio::test]
async fn test_future_campaign_not_selected() {
    let pool = memory_pool().await;
    let campaign = Campaign::new(
        "future".to_string(),
        "Test Single".to_string(),
        "Test Artist".to_string(),
        Utc::now().date_naive() + Duration::days(7),
    );
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_campaigns, 0);
}

#[tokio::test]
async fn test_inactive_campaign_not_selected() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        is_active: false,
        ..Campaign::new(
            "inactive".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();

    let platform = ScriptedPlatform::default();
    let summary = run_release_day(&pool, &platform).await.unwrap();

    assert_eq!(summary.processed_campaigns, 0);
}

#[tokio::test]
async fn test_cached_track_id_skips_resolution() {
    let pool = memory_pool().await;
    let campaign = Campaign {
        isrc: Some("USX9P2400001".to_string()),
        spotify_track_id: Some("trk_cached".to_string()),
        ..Campaign::new(
            "cached".to_string(),
            "Test Single".to_string(),
            "Test Artist".to_string(),
            yesterday(),
        )
    };
    campaigns::insert_campaign(&pool, &campaign).await.unwrap();
    insert_spotify_subscriber(&pool, campaign.id, "fan@example.com", Some("rt_valid")).await;

    let platform = ScriptedPlatform {
        access_tokens: [("rt_valid".to_string(), "tok_xyz".to_string())].into(),
        ..Default::default()
    };

    let summary = run_release_day(&pool, &platform).await.unwrap();
    assert_eq!(summary.tracks_saved, 1);

    // Resolution never ran; the cached id went straight to the save call
    let calls = platform.recorded_calls();
    assert!(!calls.contains(&"client_token".to_string()));
    assert!(calls.contains(&"save:tok_xyz:trk_cached".to_string()));
}

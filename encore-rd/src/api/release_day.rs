//! Release-day trigger endpoint
//!
//! GET/POST /api/cron/release-day - invoked daily by the external
//! scheduler, optionally by hand. The bearer-secret check happens before
//! any campaign is read or mutated: a rejected trigger consumes nothing.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::services::run_release_day;
use crate::services::RunSummary;
use crate::AppState;

/// Trigger response: run summary plus a human-readable message
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// GET/POST /api/cron/release-day
pub async fn trigger_release_day(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TriggerResponse>> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !encore_common::auth::authorize_trigger(
        auth_header,
        state.cron_secret.as_deref(),
        state.production,
    ) {
        return Err(ApiError::Unauthorized);
    }

    let summary = run_release_day(&state.db, state.platform.as_ref())
        .await
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))?;

    let message = if summary.processed_campaigns == 0 {
        "No campaigns to process".to_string()
    } else {
        "Cron job completed".to_string()
    };

    Ok(Json(TriggerResponse { message, summary }))
}

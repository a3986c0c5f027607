//! Trigger authorization for scheduled jobs
//!
//! Scheduled endpoints are invoked by a cron scheduler carrying
//! `Authorization: Bearer <secret>`. The secret is compared against the
//! configured shared secret before any work begins: a rejected trigger must
//! produce no side effects.
//!
//! # Pure Functions
//!
//! This module contains only pure functions. No HTTP framework
//! dependencies - those live in module-specific handler code.

/// Decide whether a scheduled-trigger request is authorized.
///
/// Rules:
/// - No secret configured: every trigger is allowed.
/// - Secret configured, header matches `Bearer <secret>`: allowed.
/// - Secret configured, header missing or wrong: rejected in production,
///   allowed elsewhere (manual triggers during development).
pub fn authorize_trigger(
    auth_header: Option<&str>,
    cron_secret: Option<&str>,
    production: bool,
) -> bool {
    let secret = match cron_secret {
        Some(s) if !s.is_empty() => s,
        _ => return true,
    };

    match auth_header {
        Some(header) if header == format!("Bearer {}", secret) => true,
        _ => !production,
    }
}

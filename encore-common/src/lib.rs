//! Shared library for the Encore backend services
//!
//! Holds the pieces every Encore module needs: common error types,
//! configuration loading, trigger authorization, and database pool setup.

pub mod auth;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};

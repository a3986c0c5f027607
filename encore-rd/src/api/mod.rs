//! HTTP API handlers for encore-rd

pub mod health;
pub mod release_day;

pub use health::health_routes;
pub use release_day::trigger_release_day;

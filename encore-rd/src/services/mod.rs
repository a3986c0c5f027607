//! Release-day services
//!
//! - `platform`: the streaming-platform seam (trait + errors)
//! - `spotify`: Spotify Web API client implementing the seam
//! - `resolver`: catalog identifier → track id resolution
//! - `processor`: the campaign batch processor

pub mod platform;
pub mod processor;
pub mod resolver;
pub mod spotify;

pub use platform::{PlatformError, StreamingPlatform};
pub use processor::{run_release_day, RunSummary};
pub use resolver::resolve_track_id;
pub use spotify::SpotifyClient;

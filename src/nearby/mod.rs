//! Nearby friend discovery with tiered location privacy.
//!
//! # Query Pipeline
//!
//! ```text
//! clamp radius
//!   -> load candidates (fatal on failure)
//!   -> drop stale records
//!   -> drop records outside the radius
//!   -> resolve sharing tier (failure hides the candidate)
//!   -> mask coordinate, drop hidden/blocked
//!   -> sort by distance, then owner ID
//!   -> truncate
//! ```

mod error;
mod query;
mod service;
pub mod types;

pub use error::{NearbyError, Result};
pub use query::{find_nearby, ANONYMOUS_DISPLAY_NAME};
pub use service::NearbyService;
pub use types::{NearbyConfig, NearbyQuery, NearbyResponse, NearbyResult};

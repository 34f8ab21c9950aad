//! Nearby query types and policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::{NearbyError, Result};
use crate::location::{Coordinate, DEFAULT_FRESHNESS_MINUTES};
use crate::sharing::SharingTier;

/// Query policy for nearby discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyConfig {
    /// Upper bound applied to every requested radius.
    pub max_radius_meters: u32,

    /// Radius used when the request does not specify one.
    pub default_radius_meters: u32,

    /// Locations older than this are ignored.
    pub freshness_window_minutes: i64,

    /// Maximum number of results returned.
    pub max_results: usize,

    /// Tier applied when two users have no setting between them.
    pub default_tier: SharingTier,
}

impl NearbyConfig {
    /// Returns the radius a query actually searches.
    ///
    /// Missing radii take the default; everything is clamped to the maximum.
    ///
    /// # Errors
    ///
    /// Returns [`NearbyError::InvalidInput`] for a zero radius.
    pub fn effective_radius(&self, requested: Option<u32>) -> Result<u32> {
        match requested {
            Some(0) => Err(NearbyError::InvalidInput(
                "radiusMeters must be positive".to_string(),
            )),
            Some(radius) => Ok(radius.min(self.max_radius_meters)),
            None => Ok(self.default_radius_meters.min(self.max_radius_meters)),
        }
    }

    /// Returns the freshness window as a duration.
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::minutes(self.freshness_window_minutes)
    }
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            max_radius_meters: 10_000,
            default_radius_meters: 5_000,
            freshness_window_minutes: DEFAULT_FRESHNESS_MINUTES,
            max_results: 50,
            default_tier: SharingTier::default(),
        }
    }
}

/// A validated nearby query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    /// User asking for nearby friends.
    pub requester_id: String,
    /// Where the requester is.
    pub center: Coordinate,
    /// Search radius after defaulting and clamping.
    pub radius_meters: u32,
}

/// One nearby user as disclosed to the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResult {
    /// The nearby user.
    pub owner_id: String,
    /// Display name, or a placeholder when unknown.
    pub display_name: String,
    /// Distance from the requester, rounded to whole meters.
    pub distance_meters: u32,
    /// Coordinate after masking for `tier`.
    pub masked_coordinate: Option<Coordinate>,
    /// Tier the coordinate was masked with.
    pub tier: SharingTier,
}

/// Response body of a nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyResponse {
    /// Results sorted by distance, then owner ID.
    pub users: Vec<NearbyResult>,
    /// Radius that was actually searched.
    pub search_radius: u32,
    /// When the query was evaluated.
    pub timestamp: DateTime<Utc>,
}

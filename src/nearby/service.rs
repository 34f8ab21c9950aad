//! High-level nearby discovery API.
//!
//! [`NearbyService`] loads candidates from the stores, evaluates the query
//! with [`find_nearby`](super::query::find_nearby) and handles the owner
//! side of the data: location updates and sharing settings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::error::{NearbyError, Result};
use super::query::find_nearby;
use super::types::{NearbyConfig, NearbyQuery, NearbyResponse};
use crate::location::{Coordinate, LocationRecord};
use crate::sharing::{RelationshipSharingSetting, SharingTier, TierResolver};
use crate::store::{LocationStore, RelationshipStore, UserDirectory};

/// Nearby discovery over injected stores.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use nearby_core::location::Coordinate;
/// use nearby_core::nearby::{NearbyConfig, NearbyService};
/// use nearby_core::store::SqliteStore;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = Arc::new(SqliteStore::new(&dir.path().join("nearby.db")).unwrap());
/// let service = NearbyService::new(
///     store.clone(),
///     store.clone(),
///     store,
///     NearbyConfig::default(),
/// );
///
/// let here = Coordinate::new(35.6762, 139.6503).unwrap();
/// let response = service.find_nearby("alice", here, Some(50_000)).unwrap();
/// assert_eq!(response.search_radius, 10_000);
/// assert!(response.users.is_empty());
/// ```
pub struct NearbyService {
    locations: Arc<dyn LocationStore>,
    relationships: Arc<dyn RelationshipStore>,
    directory: Arc<dyn UserDirectory>,
    config: NearbyConfig,
}

impl NearbyService {
    /// Creates a service over the given stores.
    #[must_use]
    pub fn new(
        locations: Arc<dyn LocationStore>,
        relationships: Arc<dyn RelationshipStore>,
        directory: Arc<dyn UserDirectory>,
        config: NearbyConfig,
    ) -> Self {
        Self {
            locations,
            relationships,
            directory,
            config,
        }
    }

    /// Returns the query policy.
    #[must_use]
    pub const fn config(&self) -> &NearbyConfig {
        &self.config
    }

    /// Finds users near `center` as seen by `requester_id`.
    ///
    /// # Errors
    ///
    /// - [`NearbyError::InvalidInput`] for an empty requester or zero radius
    /// - [`NearbyError::DataUnavailable`] if candidates cannot be loaded
    pub fn find_nearby(
        &self,
        requester_id: &str,
        center: Coordinate,
        radius_meters: Option<u32>,
    ) -> Result<NearbyResponse> {
        self.find_nearby_at(requester_id, center, radius_meters, Utc::now())
    }

    /// Same as [`find_nearby`](Self::find_nearby), evaluated at `now`.
    ///
    /// # Errors
    ///
    /// See [`find_nearby`](Self::find_nearby).
    pub fn find_nearby_at(
        &self,
        requester_id: &str,
        center: Coordinate,
        radius_meters: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<NearbyResponse> {
        if requester_id.is_empty() {
            return Err(NearbyError::InvalidInput("missing requester".to_string()));
        }
        let center = Coordinate::new(center.latitude, center.longitude)?;
        let radius_meters = self.config.effective_radius(radius_meters)?;

        let candidates = self
            .locations
            .locations_near(center, f64::from(radius_meters))
            .map_err(|e| {
                warn!(requester_id, "Failed to load nearby candidates: {e}");
                NearbyError::DataUnavailable(e.to_string())
            })?;

        let query = NearbyQuery {
            requester_id: requester_id.to_string(),
            center,
            radius_meters,
        };
        let resolver = TierResolver::new(self.relationships.as_ref(), self.config.default_tier);
        let users = find_nearby(
            &query,
            &candidates,
            &resolver,
            self.directory.as_ref(),
            &self.config,
            now,
        );

        debug!(
            requester_id,
            candidates = candidates.len(),
            results = users.len(),
            radius_meters,
            "Nearby query evaluated"
        );

        Ok(NearbyResponse {
            users,
            search_radius: radius_meters,
            timestamp: now,
        })
    }

    /// Overwrites `owner_id`'s last known location, captured now.
    ///
    /// # Errors
    ///
    /// - [`NearbyError::InvalidInput`] for an invalid coordinate or accuracy
    /// - [`NearbyError::Storage`] if the write fails
    pub fn update_location(
        &self,
        owner_id: &str,
        coordinate: Coordinate,
        accuracy: Option<f64>,
    ) -> Result<LocationRecord> {
        if owner_id.is_empty() {
            return Err(NearbyError::InvalidInput("missing owner".to_string()));
        }
        let coordinate = Coordinate::new(coordinate.latitude, coordinate.longitude)?;
        if accuracy.is_some_and(|a| !a.is_finite() || a < 0.0) {
            return Err(NearbyError::InvalidInput(
                "accuracy must be a non-negative number".to_string(),
            ));
        }

        let mut record = LocationRecord::new(owner_id, coordinate, Utc::now());
        record.accuracy = accuracy;
        self.locations.upsert_location(&record)?;

        Ok(record)
    }

    /// Sets how `sharer_id` shares their location with `viewer_id`.
    ///
    /// # Errors
    ///
    /// - [`NearbyError::InvalidInput`] for empty IDs or a self-referencing setting
    /// - [`NearbyError::Storage`] if the write fails
    pub fn set_sharing_tier(
        &self,
        sharer_id: &str,
        viewer_id: &str,
        tier: SharingTier,
    ) -> Result<()> {
        if sharer_id.is_empty() || viewer_id.is_empty() {
            return Err(NearbyError::InvalidInput("missing user".to_string()));
        }
        if sharer_id == viewer_id {
            return Err(NearbyError::InvalidInput(
                "cannot set a sharing tier toward yourself".to_string(),
            ));
        }

        self.relationships
            .set_sharing_setting(&RelationshipSharingSetting::new(sharer_id, viewer_id, tier))?;
        Ok(())
    }
}

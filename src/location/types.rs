//! Location data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{LocationError, Result};

/// A point on the Earth's surface in decimal degrees.
///
/// Values built through [`Coordinate::new`] are guaranteed finite with
/// latitude in `[-90, 90]` and longitude in `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidCoordinate`] if either value is not
    /// finite or lies outside its valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use nearby_core::location::Coordinate;
    ///
    /// assert!(Coordinate::new(35.6762, 139.6503).is_ok());
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(LocationError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Returns whether both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The last known location of a user.
///
/// Each owner has at most one record; every update overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// User this location belongs to
    pub owner_id: String,

    /// Raw coordinate as reported by the owner's device
    pub coordinate: Coordinate,

    /// Reported GPS accuracy in meters, if known
    pub accuracy: Option<f64>,

    /// When the location was captured (UTC). Records without a timestamp
    /// are always treated as stale.
    pub captured_at: Option<DateTime<Utc>>,
}

impl LocationRecord {
    /// Creates a record captured at the given time.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        coordinate: Coordinate,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            coordinate,
            accuracy: None,
            captured_at: Some(captured_at),
        }
    }

    /// Sets the reported accuracy.
    #[must_use]
    pub const fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Settings for the periodic location reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSettings {
    /// Update interval in minutes (5-60)
    pub update_interval_minutes: u32,
}

impl LocationSettings {
    /// Shortest allowed update interval.
    pub const MIN_INTERVAL_MINUTES: u32 = 5;
    /// Longest allowed update interval.
    pub const MAX_INTERVAL_MINUTES: u32 = 60;

    /// Returns the update interval clamped to the allowed range.
    #[must_use]
    pub fn update_interval(&self) -> std::time::Duration {
        let minutes = self
            .update_interval_minutes
            .clamp(Self::MIN_INTERVAL_MINUTES, Self::MAX_INTERVAL_MINUTES);
        std::time::Duration::from_secs(u64::from(minutes) * 60)
    }
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            update_interval_minutes: 5,
        }
    }
}

//! Location module.
//!
//! Provides the location primitives behind nearby discovery:
//! - Validated coordinates and last-known location records
//! - Great-circle (haversine) distance
//! - Freshness filtering of location records
//! - Tier-based masking that reduces or suppresses disclosed coordinates
//! - Geohash cells for candidate discovery
//! - A periodic reporter that keeps a user's location current
//!
//! # Privacy Guarantees
//!
//! - Approximate sharing rounds both axes to 2 decimal places (~1.1 km)
//! - Hidden and blocked candidates produce no coordinate at all
//! - Masking depends only on the coordinate and the resolved tier
//!
//! # Example Usage
//!
//! ```
//! use nearby_core::location::{distance_meters, mask, Coordinate};
//! use nearby_core::sharing::SharingTier;
//!
//! let shinjuku = Coordinate::new(35.6762, 139.6503).unwrap();
//! let shibuya = Coordinate::new(35.6581, 139.7414).unwrap();
//!
//! assert!(distance_meters(shinjuku, shibuya) > 5_000.0);
//!
//! let shown = mask(shibuya, SharingTier::Approximate).unwrap();
//! assert_eq!((shown.latitude, shown.longitude), (35.66, 139.74));
//! ```

mod distance;
mod error;
mod freshness;
pub mod privacy;
pub mod reporter;
pub mod types;

pub use distance::{distance_meters, EARTH_RADIUS_METERS};
pub use error::{LocationError, Result};
pub use freshness::{is_fresh, DEFAULT_FRESHNESS_MINUTES, MAX_CLOCK_SKEW_MINUTES};
pub use privacy::{
    geohash_search_cells, location_to_geohash, mask, obfuscate_coordinate,
    APPROXIMATE_DECIMAL_PLACES,
};
pub use reporter::{LocationFix, LocationReporter, LocationSource, ReporterHandle};
pub use types::{Coordinate, LocationRecord, LocationSettings};

//! Privacy-tiered location masking and geohash cell helpers.
//!
//! This module provides functions for:
//! - Coordinate obfuscation (reducing precision for privacy)
//! - Masking a coordinate according to a [`SharingTier`]
//! - Geohash encoding and search cells for candidate discovery

use super::distance::EARTH_RADIUS_METERS;
use super::types::Coordinate;
use crate::sharing::SharingTier;

/// Geohash length stored alongside every location row.
pub const STORED_GEOHASH_PRECISION: usize = 8;

/// Decimal places kept per axis for [`SharingTier::Approximate`] (~1.1 km).
pub const APPROXIMATE_DECIMAL_PLACES: i32 = 2;

/// Obfuscates a coordinate by rounding it to `decimal_places`.
///
/// # Precision vs. Accuracy
///
/// | Decimal Places | Approximate Radius | Use Case |
/// |----------------|-------------------|----------|
/// | 2              | ~1.1 km           | Approximate sharing |
/// | 4              | ~11 m             | Street level |
/// | 5              | ~1.1 m            | High precision |
///
/// # Examples
///
/// ```
/// use nearby_core::location::obfuscate_coordinate;
///
/// let raw_lat = 37.7749295;
/// let obfuscated = obfuscate_coordinate(raw_lat, 4);
/// assert_eq!(obfuscated, 37.7749);  // 4 decimal places
/// ```
#[must_use]
pub fn obfuscate_coordinate(coord: f64, decimal_places: i32) -> f64 {
    // SECURITY: never round NaN/Infinity into something that looks real
    if !coord.is_finite() {
        return 0.0;
    }

    let multiplier = 10_f64.powi(decimal_places);
    (coord * multiplier).round() / multiplier
}

/// Masks a coordinate according to the sharing tier.
///
/// - [`SharingTier::Detailed`]: returned unchanged
/// - [`SharingTier::Approximate`]: rounded to 2 decimal places per axis
/// - [`SharingTier::Hidden`] / [`SharingTier::Blocked`]: `None`
///
/// A `None` result means the candidate must be dropped from results
/// entirely, not returned with an empty coordinate.
///
/// # Examples
///
/// ```
/// use nearby_core::location::{mask, Coordinate};
/// use nearby_core::sharing::SharingTier;
///
/// let shibuya = Coordinate::new(35.6581, 139.7414).unwrap();
///
/// let approx = mask(shibuya, SharingTier::Approximate).unwrap();
/// assert_eq!(approx.latitude, 35.66);
/// assert_eq!(approx.longitude, 139.74);
///
/// assert_eq!(mask(shibuya, SharingTier::Detailed), Some(shibuya));
/// assert_eq!(mask(shibuya, SharingTier::Hidden), None);
/// ```
#[must_use]
pub fn mask(coordinate: Coordinate, tier: SharingTier) -> Option<Coordinate> {
    match tier {
        SharingTier::Detailed => Some(coordinate),
        SharingTier::Approximate => Some(Coordinate {
            latitude: obfuscate_coordinate(coordinate.latitude, APPROXIMATE_DECIMAL_PLACES),
            longitude: obfuscate_coordinate(coordinate.longitude, APPROXIMATE_DECIMAL_PLACES),
        }),
        SharingTier::Hidden | SharingTier::Blocked => None,
    }
}

/// Converts a coordinate to a geohash string of the given length.
///
/// Returns an empty string if encoding fails (non-finite or out-of-range
/// input).
///
/// # Examples
///
/// ```
/// use nearby_core::location::{location_to_geohash, Coordinate};
///
/// let geohash = location_to_geohash(Coordinate::new(37.7749, -122.4194).unwrap(), 8);
/// assert_eq!(geohash.len(), 8);
/// assert!(geohash.starts_with("9q8y"));
/// ```
#[must_use]
pub fn location_to_geohash(coordinate: Coordinate, precision: usize) -> String {
    geohash::encode(
        geohash::Coord {
            x: coordinate.longitude,
            y: coordinate.latitude,
        },
        precision,
    )
    .unwrap_or_else(|_| String::new())
}

/// Returns the smallest side, in meters, of a geohash cell of the given
/// length at the given latitude.
///
/// Longitude bits get the extra bit on odd bit counts, so cells are either
/// square or twice as wide as they are tall at the equator. Width shrinks
/// with `cos(latitude)`.
#[must_use]
pub fn geohash_cell_min_side_meters(precision: usize, latitude: f64) -> f64 {
    let bits = i32::try_from(precision.min(12) * 5).unwrap_or(60);
    let lon_bits = (bits + 1) / 2;
    let lat_bits = bits / 2;

    let meters_per_degree = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;
    let height = 180.0 / 2_f64.powi(lat_bits) * meters_per_degree;
    let width = 360.0 / 2_f64.powi(lon_bits)
        * meters_per_degree
        * latitude.to_radians().cos().abs();

    height.min(width)
}

/// Returns the geohash cells that must be scanned to find every point
/// within `radius_meters` of `center`, together with their length.
///
/// The result is the cell containing `center` plus its 8 neighbours, at the
/// longest length whose cells are still at least `radius_meters` on their
/// shortest side. Returns `None` when no such covering exists (polar
/// regions, radii beyond a single-character cell) so the caller can fall
/// back to a full scan.
#[must_use]
pub fn geohash_search_cells(
    center: Coordinate,
    radius_meters: f64,
) -> Option<(usize, Vec<String>)> {
    let precision = (1..=STORED_GEOHASH_PRECISION)
        .rev()
        .find(|&p| geohash_cell_min_side_meters(p, center.latitude) >= radius_meters)?;

    let cell = location_to_geohash(center, precision);
    if cell.is_empty() {
        return None;
    }
    let n = geohash::neighbors(&cell).ok()?;

    let mut cells = vec![cell, n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw];
    cells.sort();
    cells.dedup();
    Some((precision, cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    #[test]
    fn obfuscate_to_4_decimals() {
        let raw_lat = 37.774_929_5;
        let obfuscated = obfuscate_coordinate(raw_lat, 4);
        assert_eq!(obfuscated, 37.7749);
        assert!((raw_lat - obfuscated).abs() < 0.0001);
    }

    #[test]
    fn obfuscate_to_2_decimals() {
        let obfuscated = obfuscate_coordinate(37.774_929_5, APPROXIMATE_DECIMAL_PLACES);
        assert_eq!(obfuscated, 37.77);
    }

    #[test]
    fn obfuscate_maintains_sign() {
        let obfuscated = obfuscate_coordinate(-37.774_929_5, 4);
        assert_eq!(obfuscated, -37.7749);
    }

    #[test]
    fn mask_detailed_is_identity() {
        let c = coord(35.658_123_4, 139.741_456_7);
        assert_eq!(mask(c, SharingTier::Detailed), Some(c));
    }

    #[test]
    fn mask_approximate_rounds_to_two_decimals() {
        let masked = mask(coord(35.6581, 139.7414), SharingTier::Approximate).unwrap();
        assert_eq!(masked.latitude, 35.66);
        assert_eq!(masked.longitude, 139.74);
    }

    #[test]
    fn mask_approximate_negative_coordinates() {
        let masked = mask(coord(-33.868_82, -151.209_29), SharingTier::Approximate).unwrap();
        assert_eq!(masked.latitude, -33.87);
        assert_eq!(masked.longitude, -151.21);
    }

    #[test]
    fn mask_hidden_and_blocked_suppress() {
        let c = coord(35.6581, 139.7414);
        assert_eq!(mask(c, SharingTier::Hidden), None);
        assert_eq!(mask(c, SharingTier::Blocked), None);
    }

    #[test]
    fn geohash_precision_8() {
        let geohash = location_to_geohash(coord(37.7749, -122.4194), 8);
        assert_eq!(geohash.len(), 8);
    }

    #[test]
    fn geohash_invalid_input_is_empty() {
        let bad = Coordinate {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert!(location_to_geohash(bad, 8).is_empty());
    }

    #[test]
    fn cell_sizes_at_equator() {
        // 20 bits: 10 for latitude, 10 for longitude
        let side = geohash_cell_min_side_meters(4, 0.0);
        assert!((side - 19_545.0).abs() < 10.0, "got {side}");

        // 25 bits: 12 for latitude, 13 for longitude, square cells
        let side = geohash_cell_min_side_meters(5, 0.0);
        assert!((side - 4_886.0).abs() < 10.0, "got {side}");
    }

    #[test]
    fn cells_shrink_towards_the_poles() {
        assert!(geohash_cell_min_side_meters(4, 70.0) < geohash_cell_min_side_meters(4, 0.0));
    }

    #[test]
    fn search_cells_for_ten_km_use_precision_4() {
        let (precision, cells) = geohash_search_cells(coord(35.6762, 139.6503), 10_000.0).unwrap();
        assert_eq!(precision, 4);
        assert_eq!(cells.len(), 9);
        assert!(cells.iter().all(|c| c.len() == 4));
    }

    #[test]
    fn search_cells_cover_nearby_point() {
        let center = coord(35.6762, 139.6503);
        let other = coord(35.6581, 139.7414);
        let (precision, cells) = geohash_search_cells(center, 10_000.0).unwrap();
        let other_cell = location_to_geohash(other, precision);
        assert!(cells.contains(&other_cell));
    }

    #[test]
    fn search_cells_at_the_pole_fall_back() {
        assert!(geohash_search_cells(coord(90.0, 0.0), 10_000.0).is_none());
    }

    // SECURITY TESTS - Input Validation

    #[test]
    fn obfuscate_handles_nan() {
        assert_eq!(obfuscate_coordinate(f64::NAN, APPROXIMATE_DECIMAL_PLACES), 0.0);
    }

    #[test]
    fn obfuscate_handles_infinity() {
        assert_eq!(
            obfuscate_coordinate(f64::INFINITY, APPROXIMATE_DECIMAL_PLACES),
            0.0
        );
        assert_eq!(
            obfuscate_coordinate(f64::NEG_INFINITY, APPROXIMATE_DECIMAL_PLACES),
            0.0
        );
    }
}

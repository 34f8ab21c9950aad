//! Great-circle distance between coordinates.

use super::types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Returns the haversine distance between two coordinates, in meters.
///
/// NaN inputs propagate to a NaN result. Validate with
/// [`Coordinate::new`] before calling.
///
/// # Examples
///
/// ```
/// use nearby_core::location::{distance_meters, Coordinate};
///
/// let shinjuku = Coordinate::new(35.6762, 139.6503).unwrap();
/// let shibuya = Coordinate::new(35.6581, 139.7414).unwrap();
///
/// let d = distance_meters(shinjuku, shibuya);
/// assert!(d > 8_000.0 && d < 9_000.0);
/// ```
#[must_use]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let c = coord(37.7749, -122.4194);
        assert!(distance_meters(c, c).abs() < f64::EPSILON);
    }

    #[test]
    fn shinjuku_to_shibuya() {
        let d = distance_meters(coord(35.6762, 139.6503), coord(35.6581, 139.7414));
        assert!((8_000.0..9_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_meters(coord(0.0, 0.0), coord(1.0, 0.0));
        // 2 * pi * R / 360
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_meters(coord(0.0, 0.0), coord(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1.0);
    }

    #[test]
    fn crossing_the_date_line() {
        let d = distance_meters(coord(0.0, 179.9), coord(0.0, -179.9));
        assert!(d < 25_000.0, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        let nan = Coordinate {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert!(distance_meters(nan, coord(0.0, 0.0)).is_nan());
    }
}

//! Error types for location handling.

use thiserror::Error;

/// Error type for location operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// Coordinate is not finite or lies outside the valid range.
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// The rejected latitude.
        latitude: f64,
        /// The rejected longitude.
        longitude: f64,
    },
}

/// Result type alias for location operations.
pub type Result<T> = std::result::Result<T, LocationError>;

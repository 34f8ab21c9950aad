//! Error types for nearby queries.
//!
//! Only whole-query failures are errors. A candidate whose sharing tier
//! cannot be resolved is hidden, not reported.

use thiserror::Error;

use crate::auth::AuthError;
use crate::location::LocationError;
use crate::store::StoreError;

/// Error type for nearby operations.
#[derive(Error, Debug)]
pub enum NearbyError {
    /// Missing or malformed coordinates, radius or identifiers.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// The candidate set could not be loaded.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// A write to the backing store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Result type alias for nearby operations.
pub type Result<T> = std::result::Result<T, NearbyError>;

impl From<LocationError> for NearbyError {
    fn from(err: LocationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<AuthError> for NearbyError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential => Self::Unauthorized,
            AuthError::InvalidUserId(id) => Self::InvalidInput(format!("invalid user ID: {id}")),
            AuthError::Storage(e) => Self::Storage(e),
        }
    }
}

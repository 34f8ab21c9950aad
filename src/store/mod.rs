//! Storage collaborators for nearby discovery.
//!
//! The query logic only sees the traits defined here. Two implementations
//! are provided:
//!
//! ```text
//! SqliteStore (persistent, rusqlite)
//! MemoryStore (in-memory with failure injection, `test-utils` only)
//! ```
//!
//! All traits are synchronous. Async callers run them on the blocking pool.

mod error;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod sqlite;

pub use error::{Result, StoreError};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::location::{Coordinate, LocationRecord};
use crate::sharing::{RelationshipSharingSetting, SharingTier};

/// Last-known locations, one record per owner.
pub trait LocationStore: Send + Sync {
    /// Overwrites the owner's location record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn upsert_location(&self, record: &LocationRecord) -> Result<()>;

    /// Returns the records of the given owners. Owners without a record are
    /// skipped. Freshness is not guaranteed.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn recent_locations(&self, owner_ids: &[String]) -> Result<Vec<LocationRecord>>;

    /// Returns a superset of the records within `radius_meters` of `center`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn locations_near(&self, center: Coordinate, radius_meters: f64)
        -> Result<Vec<LocationRecord>>;
}

/// Directional sharing settings between users.
pub trait RelationshipStore: Send + Sync {
    /// Returns `sharer_id`'s setting toward `viewer_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn sharing_setting(&self, sharer_id: &str, viewer_id: &str) -> Result<Option<SharingTier>>;

    /// Creates or replaces a setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set_sharing_setting(&self, setting: &RelationshipSharingSetting) -> Result<()>;
}

/// Display names used to decorate results.
pub trait UserDirectory: Send + Sync {
    /// Returns the user's display name, if known.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn display_name(&self, user_id: &str) -> Result<Option<String>>;
}

/// Storage for access token digests, one per user.
pub trait CredentialStore: Send + Sync {
    /// Returns the hex SHA-256 digest of the user's current token secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn token_digest(&self, user_id: &str) -> Result<Option<String>>;

    /// Replaces the user's token digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_token_digest(&self, user_id: &str, digest_hex: &str) -> Result<()>;
}

//! In-memory store for tests.
//!
//! Implements every store trait and can be told to fail specific reads,
//! which lets tests exercise fail-closed and degraded paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::error::{Result, StoreError};
use super::{CredentialStore, LocationStore, RelationshipStore, UserDirectory};
use crate::location::{Coordinate, LocationRecord};
use crate::sharing::{RelationshipSharingSetting, SharingTier};

#[derive(Default)]
struct Inner {
    locations: HashMap<String, LocationRecord>,
    settings: HashMap<(String, String), SharingTier>,
    users: HashMap<String, String>,
    tokens: HashMap<String, String>,
    fail_locations: bool,
    fail_directory: bool,
    failing_sharing_users: HashSet<String>,
    location_writes: usize,
}

/// Store backed by hash maps, with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire store lock: {e}")))
    }

    /// Makes every location read and write fail (or succeed again).
    pub fn fail_locations(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_locations = fail;
        }
    }

    /// Makes every display name lookup fail.
    pub fn fail_directory(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_directory = fail;
        }
    }

    /// Makes every sharing lookup involving `user_id` fail.
    pub fn fail_sharing_lookups_for(&self, user_id: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.failing_sharing_users.insert(user_id.to_string());
        }
    }

    /// Returns how many location writes have succeeded.
    #[must_use]
    pub fn location_write_count(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.location_writes)
    }

    /// Saves a user's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn save_user(&self, user_id: &str, display_name: &str) -> Result<()> {
        self.inner()?
            .users
            .insert(user_id.to_string(), display_name.to_string());
        Ok(())
    }
}

fn injected(what: &str) -> StoreError {
    StoreError::Storage(format!("Injected {what} failure"))
}

impl LocationStore for MemoryStore {
    fn upsert_location(&self, record: &LocationRecord) -> Result<()> {
        let mut inner = self.inner()?;
        if inner.fail_locations {
            return Err(injected("location write"));
        }
        inner
            .locations
            .insert(record.owner_id.clone(), record.clone());
        inner.location_writes += 1;
        Ok(())
    }

    fn recent_locations(&self, owner_ids: &[String]) -> Result<Vec<LocationRecord>> {
        let inner = self.inner()?;
        if inner.fail_locations {
            return Err(injected("location read"));
        }
        Ok(owner_ids
            .iter()
            .filter_map(|id| inner.locations.get(id).cloned())
            .collect())
    }

    fn locations_near(
        &self,
        _center: Coordinate,
        _radius_meters: f64,
    ) -> Result<Vec<LocationRecord>> {
        let inner = self.inner()?;
        if inner.fail_locations {
            return Err(injected("location read"));
        }
        Ok(inner.locations.values().cloned().collect())
    }
}

impl RelationshipStore for MemoryStore {
    fn sharing_setting(&self, sharer_id: &str, viewer_id: &str) -> Result<Option<SharingTier>> {
        let inner = self.inner()?;
        if inner.failing_sharing_users.contains(sharer_id)
            || inner.failing_sharing_users.contains(viewer_id)
        {
            return Err(injected("sharing lookup"));
        }
        Ok(inner
            .settings
            .get(&(sharer_id.to_string(), viewer_id.to_string()))
            .copied())
    }

    fn set_sharing_setting(&self, setting: &RelationshipSharingSetting) -> Result<()> {
        self.inner()?.settings.insert(
            (setting.sharer_id.clone(), setting.viewer_id.clone()),
            setting.tier,
        );
        Ok(())
    }
}

impl UserDirectory for MemoryStore {
    fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        let inner = self.inner()?;
        if inner.fail_directory {
            return Err(injected("directory"));
        }
        Ok(inner.users.get(user_id).cloned())
    }
}

impl CredentialStore for MemoryStore {
    fn token_digest(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.inner()?.tokens.get(user_id).cloned())
    }

    fn save_token_digest(&self, user_id: &str, digest_hex: &str) -> Result<()> {
        self.inner()?
            .tokens
            .insert(user_id.to_string(), digest_hex.to_string());
        Ok(())
    }
}

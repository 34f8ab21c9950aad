//! `SQLite` storage for locations, sharing settings, users and credentials.
//!
//! # Privacy
//!
//! Only the latest location of each user is kept; every update overwrites
//! the previous row. Access tokens are never stored, only their digests.

// SQLite operations need to hold the lock for the duration of the operation.
// Dropping the guard earlier would require restructuring all methods.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::warn;

use super::error::{Result, StoreError};
use super::{CredentialStore, LocationStore, RelationshipStore, UserDirectory};
use crate::location::privacy::STORED_GEOHASH_PRECISION;
use crate::location::{geohash_search_cells, location_to_geohash, Coordinate, LocationRecord};
use crate::sharing::{RelationshipSharingSetting, SharingTier};

/// Sorts after every character of the geohash alphabet.
const GEOHASH_PREFIX_END: char = '{';

type LocationRow = (String, f64, f64, Option<f64>, Option<i64>);

/// `SQLite`-based storage.
///
/// Thread-safe wrapper around a `SQLite` connection implementing every
/// store trait.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new storage instance at the given path.
    ///
    /// Creates the database file and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            -- Last known location per user (overwritten on every update)
            CREATE TABLE IF NOT EXISTS locations (
                owner_id TEXT PRIMARY KEY,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                accuracy REAL,
                captured_at INTEGER,
                geohash TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_locations_geohash ON locations(geohash);

            -- Directional sharing settings (sharer -> viewer)
            CREATE TABLE IF NOT EXISTS sharing_settings (
                sharer_id TEXT NOT NULL,
                viewer_id TEXT NOT NULL,
                tier TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (sharer_id, viewer_id)
            );

            -- User directory
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- One access token digest per user
            CREATE TABLE IF NOT EXISTS access_tokens (
                user_id TEXT PRIMARY KEY,
                token_digest TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    // ==================== User Operations ====================

    /// Saves a user's display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_user(&self, user_id: &str, display_name: &str) -> Result<()> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();

        conn.execute(
            r"
            INSERT INTO users (user_id, display_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                updated_at = excluded.updated_at
            ",
            params![user_id, display_name, now],
        )?;

        Ok(())
    }
}

fn row_to_location(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

/// Rows with out-of-range coordinates are skipped rather than failing the
/// whole read.
fn into_records(rows: Vec<LocationRow>) -> Vec<LocationRecord> {
    rows.into_iter()
        .filter_map(|(owner_id, latitude, longitude, accuracy, captured_at)| {
            let Ok(coordinate) = Coordinate::new(latitude, longitude) else {
                warn!(owner_id = %owner_id, "Skipping stored location with invalid coordinate");
                return None;
            };
            Some(LocationRecord {
                owner_id,
                coordinate,
                accuracy,
                captured_at: captured_at.and_then(DateTime::<Utc>::from_timestamp_millis),
            })
        })
        .collect()
}

impl LocationStore for SqliteStore {
    fn upsert_location(&self, record: &LocationRecord) -> Result<()> {
        if !record.coordinate.is_valid() {
            return Err(StoreError::InvalidData(format!(
                "Invalid coordinate for {}",
                record.owner_id
            )));
        }

        let conn = self.conn()?;
        let geohash = location_to_geohash(record.coordinate, STORED_GEOHASH_PRECISION);

        conn.execute(
            r"
            INSERT INTO locations (owner_id, latitude, longitude, accuracy, captured_at, geohash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(owner_id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                accuracy = excluded.accuracy,
                captured_at = excluded.captured_at,
                geohash = excluded.geohash
            ",
            params![
                &record.owner_id,
                record.coordinate.latitude,
                record.coordinate.longitude,
                record.accuracy,
                record.captured_at.map(|t| t.timestamp_millis()),
                &geohash,
            ],
        )?;

        Ok(())
    }

    fn recent_locations(&self, owner_ids: &[String]) -> Result<Vec<LocationRecord>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let placeholders = vec!["?"; owner_ids.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT owner_id, latitude, longitude, accuracy, captured_at
            FROM locations
            WHERE owner_id IN ({placeholders})
            "
        ))?;

        let rows = stmt
            .query_map(params_from_iter(owner_ids.iter()), row_to_location)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(into_records(rows))
    }

    fn locations_near(
        &self,
        center: Coordinate,
        radius_meters: f64,
    ) -> Result<Vec<LocationRecord>> {
        let conn = self.conn()?;

        let rows = if let Some((_, cells)) = geohash_search_cells(center, radius_meters) {
            let clauses = vec!["(geohash >= ? AND geohash < ?)"; cells.len()].join(" OR ");
            let bounds: Vec<String> = cells
                .iter()
                .flat_map(|cell| [cell.clone(), format!("{cell}{GEOHASH_PREFIX_END}")])
                .collect();

            let mut stmt = conn.prepare(&format!(
                r"
                SELECT owner_id, latitude, longitude, accuracy, captured_at
                FROM locations
                WHERE {clauses}
                "
            ))?;
            let rows = stmt
                .query_map(params_from_iter(bounds.iter()), row_to_location)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(
                r"
                SELECT owner_id, latitude, longitude, accuracy, captured_at
                FROM locations
                ",
            )?;
            let rows = stmt
                .query_map([], row_to_location)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(into_records(rows))
    }
}

impl RelationshipStore for SqliteStore {
    fn sharing_setting(&self, sharer_id: &str, viewer_id: &str) -> Result<Option<SharingTier>> {
        let conn = self.conn()?;

        let tier: Option<String> = conn
            .query_row(
                r"
                SELECT tier FROM sharing_settings
                WHERE sharer_id = ?1 AND viewer_id = ?2
                ",
                params![sharer_id, viewer_id],
                |row| row.get(0),
            )
            .optional()?;

        tier.map(|tier| {
            SharingTier::parse(&tier)
                .ok_or_else(|| StoreError::InvalidData(format!("Invalid sharing tier: {tier}")))
        })
        .transpose()
    }

    fn set_sharing_setting(&self, setting: &RelationshipSharingSetting) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r"
            INSERT INTO sharing_settings (sharer_id, viewer_id, tier, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(sharer_id, viewer_id) DO UPDATE SET
                tier = excluded.tier,
                updated_at = excluded.updated_at
            ",
            params![
                &setting.sharer_id,
                &setting.viewer_id,
                setting.tier.as_str(),
                Utc::now().timestamp(),
            ],
        )?;

        Ok(())
    }
}

impl UserDirectory for SqliteStore {
    fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let name = conn
            .query_row(
                "SELECT display_name FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(name)
    }
}

impl CredentialStore for SqliteStore {
    fn token_digest(&self, user_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let digest = conn
            .query_row(
                "SELECT token_digest FROM access_tokens WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(digest)
    }

    fn save_token_digest(&self, user_id: &str, digest_hex: &str) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r"
            INSERT INTO access_tokens (user_id, token_digest, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                token_digest = excluded.token_digest,
                created_at = excluded.created_at
            ",
            params![user_id, digest_hex, Utc::now().timestamp()],
        )?;

        Ok(())
    }
}

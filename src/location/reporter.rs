//! Periodic location reporting.
//!
//! A [`LocationReporter`] is built explicitly with the device location
//! source, the store it writes to and the update interval. [`spawn`]
//! starts the periodic task and returns a [`ReporterHandle`]; the task
//! runs until the handle is cancelled or dropped.
//!
//! [`spawn`]: LocationReporter::spawn

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::types::{Coordinate, LocationRecord, LocationSettings};
use crate::store::{LocationStore, StoreError};

/// A single position fix from the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Reported coordinate
    pub coordinate: Coordinate,
    /// Reported accuracy in meters, if known
    pub accuracy: Option<f64>,
}

/// Source of the device's current position.
pub trait LocationSource: Send + Sync {
    /// Returns the current fix, or `None` if no position is available
    /// (permission denied, no signal).
    fn current_location(&self) -> Option<LocationFix>;
}

/// Writes the owner's position to a [`LocationStore`] on a fixed interval.
pub struct LocationReporter {
    owner_id: String,
    source: Arc<dyn LocationSource>,
    store: Arc<dyn LocationStore>,
    interval: Duration,
}

impl LocationReporter {
    /// Creates a reporter for `owner_id`.
    ///
    /// The interval comes from [`LocationSettings::update_interval`] and is
    /// therefore clamped to 5-60 minutes.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        source: Arc<dyn LocationSource>,
        store: Arc<dyn LocationStore>,
        settings: &LocationSettings,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            source,
            store,
            interval: settings.update_interval(),
        }
    }

    /// Returns the interval between reports.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Reads the current fix and overwrites the owner's stored location.
    ///
    /// Returns `Ok(false)` when no valid fix was available and nothing was
    /// written.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn report_now(&self) -> Result<bool, StoreError> {
        let Some(fix) = self.source.current_location() else {
            return Ok(false);
        };

        if !fix.coordinate.is_valid() {
            warn!(owner_id = %self.owner_id, "Discarding invalid location fix");
            return Ok(false);
        }

        let mut record = LocationRecord::new(self.owner_id.clone(), fix.coordinate, Utc::now());
        record.accuracy = fix.accuracy;
        self.store.upsert_location(&record)?;

        Ok(true)
    }

    /// Starts reporting on a background task.
    ///
    /// The first report happens immediately, then once per interval.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(self) -> ReporterHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let reporter = Arc::new(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(reporter.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!(owner_id = %reporter.owner_id, "Location reporter stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let current = Arc::clone(&reporter);
                        match tokio::task::spawn_blocking(move || current.report_now()).await {
                            Ok(Ok(true)) => debug!(owner_id = %reporter.owner_id, "Location reported"),
                            Ok(Ok(false)) => debug!(owner_id = %reporter.owner_id, "No location fix available"),
                            Ok(Err(e)) => warn!(owner_id = %reporter.owner_id, "Location report failed: {e}"),
                            Err(e) => warn!(owner_id = %reporter.owner_id, "Location report task failed: {e}"),
                        }
                    }
                }
            }
        });

        ReporterHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running [`LocationReporter`] task.
///
/// Dropping the handle also stops the task.
pub struct ReporterHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReporterHandle {
    /// Stops the reporter and waits for the task to finish.
    pub async fn cancel(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    /// Returns whether the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::MemoryStore;

    struct FixedSource(Mutex<Option<LocationFix>>);

    impl LocationSource for FixedSource {
        fn current_location(&self) -> Option<LocationFix> {
            *self.0.lock().unwrap()
        }
    }

    fn fix(latitude: f64, longitude: f64) -> LocationFix {
        LocationFix {
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            accuracy: Some(8.0),
        }
    }

    fn reporter(source: Option<LocationFix>, store: &Arc<MemoryStore>) -> LocationReporter {
        LocationReporter::new(
            "alice",
            Arc::new(FixedSource(Mutex::new(source))),
            Arc::clone(store) as Arc<dyn LocationStore>,
            &LocationSettings::default(),
        )
    }

    #[test]
    fn report_now_writes_record() {
        let store = Arc::new(MemoryStore::new());
        let reporter = reporter(Some(fix(35.6762, 139.6503)), &store);

        assert!(reporter.report_now().unwrap());

        let records = store.recent_locations(&["alice".to_string()]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coordinate.latitude, 35.6762);
        assert_eq!(records[0].accuracy, Some(8.0));
        assert!(records[0].captured_at.is_some());
    }

    #[test]
    fn report_now_without_fix_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let reporter = reporter(None, &store);

        assert!(!reporter.report_now().unwrap());
        assert!(store.recent_locations(&["alice".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn report_now_discards_invalid_fix() {
        let store = Arc::new(MemoryStore::new());
        let reporter = reporter(Some(fix(f64::NAN, 139.6503)), &store);

        assert!(!reporter.report_now().unwrap());
        assert!(store.recent_locations(&["alice".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn report_now_propagates_store_failure() {
        let store = Arc::new(MemoryStore::new());
        store.fail_locations(true);
        let reporter = reporter(Some(fix(35.6762, 139.6503)), &store);

        assert!(reporter.report_now().is_err());
    }

    #[test]
    fn interval_comes_from_settings() {
        let store = Arc::new(MemoryStore::new());
        let reporter = LocationReporter::new(
            "alice",
            Arc::new(FixedSource(Mutex::new(None))),
            store,
            &LocationSettings {
                update_interval_minutes: 15,
            },
        );
        assert_eq!(reporter.interval(), Duration::from_secs(15 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_reporter_reports_until_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let reporter = reporter(Some(fix(35.6762, 139.6503)), &store);
        let interval = reporter.interval();

        let handle = reporter.spawn();
        tokio::time::sleep(interval * 2 + Duration::from_secs(1)).await;

        let writes = store.location_write_count();
        assert!(writes >= 2, "expected at least 2 writes, got {writes}");

        handle.cancel().await;
        tokio::time::sleep(interval * 3).await;
        assert_eq!(store.location_write_count(), writes);
    }

    #[tokio::test]
    async fn dropping_handle_stops_task() {
        let store = Arc::new(MemoryStore::new());
        let handle = reporter(None, &store).spawn();
        let ReporterHandle { shutdown, task } = handle;

        drop(shutdown);
        task.await.unwrap();
    }
}

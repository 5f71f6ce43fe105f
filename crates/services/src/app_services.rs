use std::sync::Arc;

use storage::progress_store::ProgressStore;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress::{ProgressOverview, ProgressTracker};

/// Assembles the app-facing services for one session.
pub struct AppServices {
    tracker: ProgressTracker,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// progress load fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock).await
    }

    /// Build services backed by a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the initial progress load fails.
    pub async fn in_memory(clock: Clock) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock).await
    }

    async fn from_storage(storage: &Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let store = ProgressStore::new(Arc::clone(&storage.key_values));
        let tracker = ProgressTracker::load(clock, store).await?;
        Ok(Self { tracker })
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        ProgressOverview::from_tracker(&self.tracker)
    }
}

use std::sync::Arc;

use chrono::NaiveDate;
use learn_core::model::UserProgress;
use tracing::{debug, warn};

use crate::repository::{KeyValueRepository, StorageError};

/// Key under which the whole progress record is stored.
pub const PROGRESS_KEY: &str = "lingo.user_progress";

/// Loads and saves the single `UserProgress` record as one JSON value.
#[derive(Clone)]
pub struct ProgressStore {
    repo: Arc<dyn KeyValueRepository>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self { repo }
    }

    /// Load the stored record as seen on `today`.
    ///
    /// A missing record, or one that is not a JSON object, yields the default
    /// record. Bad individual fields fall back to their defaults. When the
    /// last login was not on `today` the returned copy has its daily XP
    /// zeroed; that reset is only persisted by the next save.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend itself cannot be read.
    pub async fn load(&self, today: NaiveDate) -> Result<UserProgress, StorageError> {
        let Some(raw) = self.repo.get_value(PROGRESS_KEY).await? else {
            debug!("no stored progress; starting from defaults");
            return Ok(UserProgress::default());
        };

        let mut progress = match serde_json::from_str::<UserProgress>(&raw) {
            Ok(progress) => progress,
            Err(err) => {
                warn!(error = %err, "stored progress is unreadable; starting from defaults");
                return Ok(UserProgress::default());
            }
        };

        if progress.last_login_date() != Some(today) {
            progress.reset_today_xp();
        }
        Ok(progress)
    }

    /// Overwrite the stored record with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or writing fails.
    pub async fn save(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let raw = serde_json::to_string(progress)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.repo.put_value(PROGRESS_KEY, &raw).await?;
        debug!(total_xp = progress.total_xp(), "progress saved");
        Ok(())
    }
}

use chrono::NaiveDate;
use tracing::{debug, info};

use learn_core::model::{LessonId, ModuleId, QuizId, QuizScore, UserProgress};
use learn_core::rewards::{Badge, Level, RewardKind, level_for, next_level_for};
use learn_core::time::Clock;
use storage::progress_store::ProgressStore;

use super::badges::is_unlocked;
use crate::error::ProgressError;

//
// ─── REWARD RECEIPT ────────────────────────────────────────────────────────────
//

/// XP credited by a single tracker operation, in crediting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardReceipt {
    credits: Vec<(RewardKind, u32)>,
    level_up: Option<&'static Level>,
}

impl RewardReceipt {
    #[must_use]
    pub fn credits(&self) -> &[(RewardKind, u32)] {
        &self.credits
    }

    /// Sum of all credits in this receipt.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.credits
            .iter()
            .fold(0_u32, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// The level reached if the operation crossed a band boundary.
    #[must_use]
    pub fn level_up(&self) -> Option<&'static Level> {
        self.level_up
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Owns the in-memory progress record and persists it after every mutation.
///
/// Construct one per application session and hand it to whatever needs it;
/// mutations take `&mut self` so a record is never observed half-updated.
pub struct ProgressTracker {
    clock: Clock,
    store: ProgressStore,
    progress: UserProgress,
}

impl ProgressTracker {
    /// Load the stored record (or defaults) for the clock's current day.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the backend cannot be read.
    pub async fn load(clock: Clock, store: ProgressStore) -> Result<Self, ProgressError> {
        let progress = store.load(clock.today()).await?;
        debug!(
            total_xp = progress.total_xp(),
            streak = progress.streak(),
            "progress loaded"
        );
        Ok(Self {
            clock,
            store,
            progress,
        })
    }

    /// Replace the clock (usually for deterministic testing).
    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    // ─── Derived queries ───────────────────────────────────────────────────────

    #[must_use]
    pub fn current_level(&self) -> &'static Level {
        level_for(self.progress.total_xp())
    }

    #[must_use]
    pub fn next_level(&self) -> Option<&'static Level> {
        next_level_for(self.progress.total_xp())
    }

    /// Percentage of the way from the current band's floor to the next band's
    /// floor, in `0.0..=100.0`. Always `100.0` in the top band.
    #[must_use]
    pub fn progress_to_next_level(&self) -> f64 {
        let current = self.current_level();
        let Some(next) = self.next_level() else {
            return 100.0;
        };
        // Bands are contiguous and strictly increasing, so the span is positive.
        let span = next.min_xp() - current.min_xp();
        let gained = self.progress.total_xp().saturating_sub(current.min_xp());
        (f64::from(gained) / f64::from(span) * 100.0).min(100.0)
    }

    /// XP still needed to reach the next band, `None` in the top band.
    #[must_use]
    pub fn xp_to_next_level(&self) -> Option<u32> {
        self.next_level()
            .map(|next| next.min_xp().saturating_sub(self.progress.total_xp()))
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Credit the XP for `kind` and persist. Returns the amount credited.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn award_xp(&mut self, kind: RewardKind) -> Result<u32, ProgressError> {
        let mut receipt = RewardReceipt::default();
        self.credit(&mut receipt, kind).await?;
        Ok(receipt.total())
    }

    /// Unlock every badge whose rule now holds and that is not yet held.
    ///
    /// Returns the newly unlocked badges in catalog order; an immediate second
    /// call returns an empty list. Persists once per non-empty batch.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn check_and_award_badges(&mut self) -> Result<Vec<Badge>, ProgressError> {
        let earned: Vec<Badge> = Badge::ALL
            .into_iter()
            .filter(|badge| !self.progress.has_badge(*badge) && is_unlocked(*badge, &self.progress))
            .collect();
        if earned.is_empty() {
            return Ok(earned);
        }

        for badge in &earned {
            self.progress.unlock_badge(*badge);
            info!(badge = badge.id(), "badge unlocked");
        }
        self.persist().await?;
        Ok(earned)
    }

    /// Record today's login, maintaining the streak.
    ///
    /// Returns `None` if a login was already recorded today. Otherwise the
    /// streak grows by one when the previous login was yesterday and restarts
    /// at one after any gap, daily XP restarts, and the login reward (plus the
    /// 7-day bonus when the streak lands exactly on 7) is credited.
    ///
    /// The login and its credits are saved together. If that save fails the
    /// in-memory record is rolled back, so a retry records the login again.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn record_daily_login(&mut self) -> Result<Option<RewardReceipt>, ProgressError> {
        let today = self.clock.today();
        let previous = self.progress.last_login_date();
        if previous == Some(today) {
            return Ok(None);
        }

        let streak = if continues_streak(previous, today) {
            self.progress.streak().saturating_add(1)
        } else {
            1
        };
        let snapshot = self.progress.clone();
        self.progress.record_login(today, streak);
        self.progress.reset_today_xp();

        let mut receipt = RewardReceipt::default();
        self.apply(&mut receipt, RewardKind::DailyLogin);
        if streak == 7 {
            self.apply(&mut receipt, RewardKind::Streak7Day);
        }
        if let Err(err) = self.persist().await {
            self.progress = snapshot;
            return Err(err);
        }
        info!(streak, day = %today, "daily login");
        Ok(Some(receipt))
    }

    /// Mark a lesson complete. Repeating a lesson credits nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn complete_lesson(
        &mut self,
        lesson_id: LessonId,
    ) -> Result<RewardReceipt, ProgressError> {
        let mut receipt = RewardReceipt::default();
        if !self.progress.insert_lesson(lesson_id) {
            return Ok(receipt);
        }
        self.credit(&mut receipt, RewardKind::LessonComplete).await?;
        Ok(receipt)
    }

    /// Store the latest score for a quiz. Every perfect submission counts,
    /// including repeats of the same quiz.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn record_quiz_score(
        &mut self,
        quiz_id: QuizId,
        score: QuizScore,
    ) -> Result<RewardReceipt, ProgressError> {
        let mut receipt = RewardReceipt::default();
        self.progress.set_quiz_score(quiz_id, score);
        if score.is_perfect() {
            self.credit(&mut receipt, RewardKind::PerfectQuiz).await?;
        } else {
            self.persist().await?;
        }
        Ok(receipt)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn record_speaking_exercise(&mut self) -> Result<RewardReceipt, ProgressError> {
        let mut receipt = RewardReceipt::default();
        self.progress.increment_speaking_recordings();
        self.credit(&mut receipt, RewardKind::RecordSpeaking).await?;
        Ok(receipt)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn complete_workbook_exercise(&mut self) -> Result<RewardReceipt, ProgressError> {
        let mut receipt = RewardReceipt::default();
        self.progress.increment_workbook_exercises();
        self.credit(&mut receipt, RewardKind::WorkbookExercise)
            .await?;
        Ok(receipt)
    }

    /// Mark a module complete. Repeating a module credits nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the record cannot be saved.
    pub async fn complete_module(
        &mut self,
        module_id: ModuleId,
    ) -> Result<RewardReceipt, ProgressError> {
        let mut receipt = RewardReceipt::default();
        if !self.progress.insert_module(module_id) {
            return Ok(receipt);
        }
        self.credit(&mut receipt, RewardKind::ModuleComplete).await?;
        Ok(receipt)
    }

    /// Credit `kind` in memory only.
    fn apply(&mut self, receipt: &mut RewardReceipt, kind: RewardKind) {
        let before = self.current_level();
        let amount = kind.xp();
        self.progress.credit_xp(amount);
        receipt.credits.push((kind, amount));
        debug!(kind = %kind, amount, total_xp = self.progress.total_xp(), "xp awarded");

        let after = self.current_level();
        if after != before {
            info!(level = after.name(), "level up");
            receipt.level_up = Some(after);
        }
    }

    async fn credit(
        &mut self,
        receipt: &mut RewardReceipt,
        kind: RewardKind,
    ) -> Result<(), ProgressError> {
        self.apply(receipt, kind);
        self.persist().await
    }

    async fn persist(&self) -> Result<(), ProgressError> {
        self.store.save(&self.progress).await?;
        Ok(())
    }
}

fn continues_streak(previous: Option<NaiveDate>, today: NaiveDate) -> bool {
    previous.is_some() && previous == today.pred_opt()
}

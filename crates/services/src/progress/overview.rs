use serde::Serialize;

use learn_core::rewards::BADGE_DEFINITIONS;

use super::tracker::ProgressTracker;

/// One catalog entry with its unlock state, for badge grids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub requirement: &'static str,
    pub unlocked: bool,
}

/// Aggregated dashboard view of the progress record, useful for UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub total_xp: u32,
    pub today_xp: u32,
    pub streak: u32,
    pub level: &'static str,
    pub next_level: Option<&'static str>,
    pub xp_to_next_level: Option<u32>,
    pub level_progress_percent: f64,
    pub lessons_completed: usize,
    pub modules_completed: usize,
    pub speaking_recordings: u32,
    pub workbook_exercises_completed: u32,
    pub quizzes_taken: usize,
    pub average_quiz_score: Option<f64>,
    pub badges: Vec<BadgeStatus>,
}

impl ProgressOverview {
    #[must_use]
    pub fn from_tracker(tracker: &ProgressTracker) -> Self {
        let progress = tracker.progress();
        let scores = progress.quiz_scores();
        let average_quiz_score = if scores.is_empty() {
            None
        } else {
            let sum: u32 = scores.values().map(|s| u32::from(s.value())).sum();
            // Quiz counts stay far below f64's exact integer range.
            #[allow(clippy::cast_precision_loss)]
            let count = scores.len() as f64;
            Some(f64::from(sum) / count)
        };

        let badges = BADGE_DEFINITIONS
            .iter()
            .map(|def| BadgeStatus {
                id: def.badge.id(),
                name: def.name,
                requirement: def.requirement,
                unlocked: progress.has_badge(def.badge),
            })
            .collect();

        Self {
            total_xp: progress.total_xp(),
            today_xp: progress.today_xp(),
            streak: progress.streak(),
            level: tracker.current_level().name(),
            next_level: tracker.next_level().map(|level| level.name()),
            xp_to_next_level: tracker.xp_to_next_level(),
            level_progress_percent: tracker.progress_to_next_level(),
            lessons_completed: progress.lessons_completed().len(),
            modules_completed: progress.modules_completed().len(),
            speaking_recordings: progress.speaking_recordings(),
            workbook_exercises_completed: progress.workbook_exercises_completed(),
            quizzes_taken: scores.len(),
            average_quiz_score,
            badges,
        }
    }

    /// Number of badges unlocked out of the full catalog.
    #[must_use]
    pub fn unlocked_badge_count(&self) -> usize {
        self.badges.iter().filter(|b| b.unlocked).count()
    }

    /// Pretty JSON rendering for machine consumers.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

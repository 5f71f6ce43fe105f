use learn_core::model::UserProgress;
use learn_core::rewards::Badge;

/// Whether `progress` satisfies the unlock rule for `badge`.
///
/// Food Fluent, Ready to Travel, Confidence Builder and Graduate have catalog
/// entries but no unlock rule yet, so they never unlock.
#[must_use]
pub fn is_unlocked(badge: Badge, progress: &UserProgress) -> bool {
    match badge {
        Badge::FirstFlame => !progress.lessons_completed().is_empty(),
        Badge::WeekWarrior => progress.streak() >= 7,
        Badge::VoiceActivated => progress.speaking_recordings() >= 10,
        Badge::Perfectionist => progress.perfect_quiz_count() >= 5,
        Badge::BilingualBoss => progress.total_xp() >= 5_000,
        Badge::FoodFluent | Badge::ReadyToTravel | Badge::ConfidenceBuilder | Badge::Graduate => {
            false
        }
    }
}

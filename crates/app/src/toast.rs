//! Turns tracker results into one-line notifications.

use learn_core::rewards::{Badge, RewardKind};
use services::{ProgressOverview, RewardReceipt};

#[must_use]
pub fn reward_lines(receipt: &RewardReceipt) -> Vec<String> {
    let mut lines: Vec<String> = receipt
        .credits()
        .iter()
        .map(|(kind, amount)| format!("+{amount} XP  {}", describe(*kind)))
        .collect();
    if let Some(level) = receipt.level_up() {
        lines.push(format!("Level up! You are now {}", level.name()));
    }
    lines
}

#[must_use]
pub fn badge_lines(badges: &[Badge]) -> Vec<String> {
    badges
        .iter()
        .map(|badge| {
            let def = badge.definition();
            format!("Badge unlocked: {} ({})", def.name, def.requirement)
        })
        .collect()
}

#[must_use]
pub fn overview_lines(overview: &ProgressOverview) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Level: {} ({:.0}%{})",
            overview.level,
            overview.level_progress_percent,
            match (overview.next_level, overview.xp_to_next_level) {
                (Some(next), Some(left)) => format!(", {left} XP to {next}"),
                _ => String::new(),
            }
        ),
        format!(
            "XP: {} total, {} today  |  Streak: {} day(s)",
            overview.total_xp, overview.today_xp, overview.streak
        ),
        format!(
            "Lessons: {}  Modules: {}  Speaking: {}  Workbook: {}",
            overview.lessons_completed,
            overview.modules_completed,
            overview.speaking_recordings,
            overview.workbook_exercises_completed
        ),
    ];
    match overview.average_quiz_score {
        Some(avg) => lines.push(format!(
            "Quizzes: {} taken, average {avg:.1}%",
            overview.quizzes_taken
        )),
        None => lines.push("Quizzes: none taken yet".to_owned()),
    }
    lines.push(format!(
        "Badges: {}/{}",
        overview.unlocked_badge_count(),
        overview.badges.len()
    ));
    lines
}

fn describe(kind: RewardKind) -> &'static str {
    match kind {
        RewardKind::LessonComplete => "lesson complete",
        RewardKind::PerfectQuiz => "perfect quiz",
        RewardKind::DailyLogin => "daily login",
        RewardKind::Streak7Day => "7-day streak",
        RewardKind::RecordSpeaking => "speaking practice",
        RewardKind::WorkbookExercise => "workbook exercise",
        RewardKind::ModuleComplete => "module complete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::ModuleId;
    use learn_core::time::fixed_clock;
    use services::AppServices;

    #[test]
    fn badge_lines_use_catalog_metadata() {
        let lines = badge_lines(&[Badge::FirstFlame, Badge::WeekWarrior]);
        assert_eq!(
            lines,
            vec![
                "Badge unlocked: First Flame (Complete your first lesson)".to_owned(),
                "Badge unlocked: Week Warrior (Keep a 7-day streak)".to_owned(),
            ]
        );
    }

    #[test]
    fn empty_receipt_renders_nothing() {
        assert!(reward_lines(&RewardReceipt::default()).is_empty());
    }

    #[tokio::test]
    async fn receipt_with_level_up_renders_both_lines() {
        let mut services = AppServices::in_memory(fixed_clock()).await.unwrap();
        let tracker = services.tracker_mut();
        tracker.complete_module(ModuleId::new("a")).await.unwrap();
        tracker.complete_module(ModuleId::new("b")).await.unwrap();
        let receipt = tracker.complete_module(ModuleId::new("c")).await.unwrap();

        assert_eq!(
            reward_lines(&receipt),
            vec![
                "+200 XP  module complete".to_owned(),
                "Level up! You are now Explorer".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn overview_lines_for_fresh_progress() {
        let services = AppServices::in_memory(fixed_clock()).await.unwrap();
        let lines = overview_lines(&services.overview());
        assert_eq!(lines[0], "Level: Beginner (0%, 500 XP to Explorer)");
        assert_eq!(lines[3], "Quizzes: none taken yet");
        assert_eq!(lines[4], "Badges: 0/9");
    }
}

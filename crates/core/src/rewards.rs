//! Static game-balance tables: XP per action, level bands and badge metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RewardRuleError {
    #[error("unknown reward kind: {0}")]
    UnknownRewardKind(String),
    #[error("unknown badge id: {0}")]
    UnknownBadge(String),
}

//
// ─── XP REWARDS ────────────────────────────────────────────────────────────────
//

/// Every action that credits XP.
///
/// The set is closed: callers cannot ask for a reward that has no amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    LessonComplete,
    PerfectQuiz,
    DailyLogin,
    #[serde(rename = "streak_7_day")]
    Streak7Day,
    RecordSpeaking,
    WorkbookExercise,
    ModuleComplete,
}

impl RewardKind {
    /// All reward kinds in table order.
    pub const ALL: [RewardKind; 7] = [
        RewardKind::LessonComplete,
        RewardKind::PerfectQuiz,
        RewardKind::DailyLogin,
        RewardKind::Streak7Day,
        RewardKind::RecordSpeaking,
        RewardKind::WorkbookExercise,
        RewardKind::ModuleComplete,
    ];

    /// XP credited for this action.
    #[must_use]
    pub const fn xp(self) -> u32 {
        match self {
            RewardKind::LessonComplete => 25,
            RewardKind::PerfectQuiz => 50,
            RewardKind::DailyLogin => 10,
            RewardKind::Streak7Day => 100,
            RewardKind::RecordSpeaking => 15,
            RewardKind::WorkbookExercise => 20,
            RewardKind::ModuleComplete => 200,
        }
    }

    /// Stable snake_case name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RewardKind::LessonComplete => "lesson_complete",
            RewardKind::PerfectQuiz => "perfect_quiz",
            RewardKind::DailyLogin => "daily_login",
            RewardKind::Streak7Day => "streak_7_day",
            RewardKind::RecordSpeaking => "record_speaking",
            RewardKind::WorkbookExercise => "workbook_exercise",
            RewardKind::ModuleComplete => "module_complete",
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardKind {
    type Err = RewardRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RewardKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RewardRuleError::UnknownRewardKind(s.to_owned()))
    }
}

//
// ─── LEVELS ────────────────────────────────────────────────────────────────────
//

/// A named XP band. Both bounds are inclusive; the top band has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    name: &'static str,
    min_xp: u32,
    max_xp: Option<u32>,
}

impl Level {
    const fn new(name: &'static str, min_xp: u32, max_xp: Option<u32>) -> Self {
        Self {
            name,
            min_xp,
            max_xp,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn min_xp(&self) -> u32 {
        self.min_xp
    }

    /// Upper bound of the band, `None` for the open-ended top band.
    #[must_use]
    pub fn max_xp(&self) -> Option<u32> {
        self.max_xp
    }

    #[must_use]
    pub fn contains(&self, xp: u32) -> bool {
        xp >= self.min_xp && self.max_xp.is_none_or(|max| xp <= max)
    }
}

/// Level bands in ascending order. Contiguous and non-overlapping over `[0, ∞)`.
pub const LEVELS: [Level; 5] = [
    Level::new("Beginner", 0, Some(499)),
    Level::new("Explorer", 500, Some(1_499)),
    Level::new("Traveler", 1_500, Some(2_999)),
    Level::new("Conversationalist", 3_000, Some(4_999)),
    Level::new("Fluent", 5_000, None),
];

/// Index into [`LEVELS`] of the first band containing `xp`.
///
/// Falls back to the first band, which cannot happen while the table covers
/// every value.
#[must_use]
pub fn level_index(xp: u32) -> usize {
    LEVELS
        .iter()
        .position(|level| level.contains(xp))
        .unwrap_or(0)
}

/// The band containing `xp`.
#[must_use]
pub fn level_for(xp: u32) -> &'static Level {
    &LEVELS[level_index(xp)]
}

/// The band after the one containing `xp`, if any.
#[must_use]
pub fn next_level_for(xp: u32) -> Option<&'static Level> {
    LEVELS.get(level_index(xp) + 1)
}

//
// ─── BADGES ────────────────────────────────────────────────────────────────────
//

/// Achievement identifiers. Serialized as their snake_case id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstFlame,
    WeekWarrior,
    VoiceActivated,
    Perfectionist,
    BilingualBoss,
    FoodFluent,
    ReadyToTravel,
    ConfidenceBuilder,
    Graduate,
}

/// Display metadata for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub badge: Badge,
    pub name: &'static str,
    pub requirement: &'static str,
}

/// Badge catalog in table order. Unlock order within one check follows it.
pub const BADGE_DEFINITIONS: [BadgeDefinition; 9] = [
    BadgeDefinition {
        badge: Badge::FirstFlame,
        name: "First Flame",
        requirement: "Complete your first lesson",
    },
    BadgeDefinition {
        badge: Badge::WeekWarrior,
        name: "Week Warrior",
        requirement: "Keep a 7-day streak",
    },
    BadgeDefinition {
        badge: Badge::VoiceActivated,
        name: "Voice Activated",
        requirement: "Record 10 speaking exercises",
    },
    BadgeDefinition {
        badge: Badge::Perfectionist,
        name: "Perfectionist",
        requirement: "Score 100% on 5 quizzes",
    },
    BadgeDefinition {
        badge: Badge::BilingualBoss,
        name: "Bilingual Boss",
        requirement: "Earn 5,000 XP",
    },
    BadgeDefinition {
        badge: Badge::FoodFluent,
        name: "Food Fluent",
        requirement: "Complete the food and dining module",
    },
    BadgeDefinition {
        badge: Badge::ReadyToTravel,
        name: "Ready to Travel",
        requirement: "Complete the travel module",
    },
    BadgeDefinition {
        badge: Badge::ConfidenceBuilder,
        name: "Confidence Builder",
        requirement: "Complete 50 workbook exercises",
    },
    BadgeDefinition {
        badge: Badge::Graduate,
        name: "Graduate",
        requirement: "Complete every module",
    },
];

impl Badge {
    /// All badges in catalog order.
    pub const ALL: [Badge; 9] = [
        Badge::FirstFlame,
        Badge::WeekWarrior,
        Badge::VoiceActivated,
        Badge::Perfectionist,
        Badge::BilingualBoss,
        Badge::FoodFluent,
        Badge::ReadyToTravel,
        Badge::ConfidenceBuilder,
        Badge::Graduate,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Badge::FirstFlame => "first_flame",
            Badge::WeekWarrior => "week_warrior",
            Badge::VoiceActivated => "voice_activated",
            Badge::Perfectionist => "perfectionist",
            Badge::BilingualBoss => "bilingual_boss",
            Badge::FoodFluent => "food_fluent",
            Badge::ReadyToTravel => "ready_to_travel",
            Badge::ConfidenceBuilder => "confidence_builder",
            Badge::Graduate => "graduate",
        }
    }

    #[must_use]
    pub fn definition(self) -> &'static BadgeDefinition {
        // Catalog and enum share the same order.
        &BADGE_DEFINITIONS[self as usize]
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Badge {
    type Err = RewardRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Badge::ALL
            .into_iter()
            .find(|badge| badge.id() == s)
            .ok_or_else(|| RewardRuleError::UnknownBadge(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_amounts_match_game_balance() {
        let amounts: Vec<(&str, u32)> = RewardKind::ALL
            .into_iter()
            .map(|kind| (kind.as_str(), kind.xp()))
            .collect();
        assert_eq!(
            amounts,
            vec![
                ("lesson_complete", 25),
                ("perfect_quiz", 50),
                ("daily_login", 10),
                ("streak_7_day", 100),
                ("record_speaking", 15),
                ("workbook_exercise", 20),
                ("module_complete", 200),
            ]
        );
    }

    #[test]
    fn reward_kind_parses_wire_names() {
        assert_eq!(
            "streak_7_day".parse::<RewardKind>().unwrap(),
            RewardKind::Streak7Day
        );
        assert_eq!(
            "bonus".parse::<RewardKind>().unwrap_err(),
            RewardRuleError::UnknownRewardKind("bonus".into())
        );
    }

    #[test]
    fn reward_kind_serde_matches_display() {
        for kind in RewardKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn levels_are_contiguous_and_open_ended() {
        assert_eq!(LEVELS[0].min_xp(), 0);
        for pair in LEVELS.windows(2) {
            let upper = pair[0].max_xp().expect("only the last band is open");
            assert_eq!(upper + 1, pair[1].min_xp());
        }
        assert!(LEVELS[LEVELS.len() - 1].max_xp().is_none());
    }

    #[test]
    fn level_lookup_at_boundaries() {
        assert_eq!(level_for(0).name(), "Beginner");
        assert_eq!(level_for(499).name(), "Beginner");
        assert_eq!(level_for(500).name(), "Explorer");
        assert_eq!(level_for(5_000).name(), "Fluent");
        assert_eq!(level_for(u32::MAX).name(), "Fluent");
        assert_eq!(next_level_for(0).map(Level::name), Some("Explorer"));
        assert_eq!(next_level_for(9_999), None);
    }

    #[test]
    fn badge_catalog_lines_up_with_enum() {
        for badge in Badge::ALL {
            assert_eq!(badge.definition().badge, badge);
            assert_eq!(badge.id().parse::<Badge>().unwrap(), badge);
            assert_eq!(
                serde_json::to_string(&badge).unwrap(),
                format!("\"{}\"", badge.id())
            );
        }
    }
}

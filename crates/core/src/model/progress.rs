use chrono::NaiveDate;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::{LessonId, ModuleId, QuizId};
use crate::rewards::Badge;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressModelError {
    #[error("quiz score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(u32),
}

//
// ─── QUIZ SCORE ────────────────────────────────────────────────────────────────
//

/// A percentage quiz score in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct QuizScore(u8);

impl QuizScore {
    pub const PERFECT: QuizScore = QuizScore(100);

    /// Validates a raw score.
    ///
    /// # Errors
    ///
    /// Returns `ProgressModelError::ScoreOutOfRange` for values above 100.
    pub fn new(value: u32) -> Result<Self, ProgressModelError> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(ProgressModelError::ScoreOutOfRange(value)),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_perfect(self) -> bool {
        self == Self::PERFECT
    }
}

impl TryFrom<u32> for QuizScore {
    type Error = ProgressModelError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuizScore> for u8 {
    fn from(score: QuizScore) -> Self {
        score.0
    }
}

//
// ─── USER PROGRESS ─────────────────────────────────────────────────────────────
//

/// The single persisted progress record.
///
/// Serialized field names are part of the stored format. Missing fields take
/// their defaults and unknown fields are ignored so older or newer records
/// still load. A field holding null or a value of the wrong type also falls
/// back to its default; the rest of the record is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProgress {
    #[serde(rename = "totalXP", deserialize_with = "lenient_count")]
    total_xp: u32,
    #[serde(rename = "todayXP", deserialize_with = "lenient_count")]
    today_xp: u32,
    #[serde(deserialize_with = "lenient_count")]
    streak: u32,
    #[serde(deserialize_with = "lenient_date")]
    last_login_date: Option<NaiveDate>,
    #[serde(deserialize_with = "unique_in_order")]
    lessons_completed: Vec<LessonId>,
    #[serde(deserialize_with = "lenient_scores")]
    quiz_scores: BTreeMap<QuizId, QuizScore>,
    #[serde(deserialize_with = "lenient_count")]
    speaking_recordings: u32,
    #[serde(deserialize_with = "lenient_count")]
    workbook_exercises_completed: u32,
    #[serde(deserialize_with = "unique_in_order")]
    modules_completed: Vec<ModuleId>,
    #[serde(deserialize_with = "known_badges")]
    badges: Vec<Badge>,
    #[serde(deserialize_with = "lenient_count")]
    perfect_quiz_count: u32,
}

impl UserProgress {
    #[must_use]
    pub fn total_xp(&self) -> u32 {
        self.total_xp
    }

    #[must_use]
    pub fn today_xp(&self) -> u32 {
        self.today_xp
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn last_login_date(&self) -> Option<NaiveDate> {
        self.last_login_date
    }

    #[must_use]
    pub fn lessons_completed(&self) -> &[LessonId] {
        &self.lessons_completed
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<QuizId, QuizScore> {
        &self.quiz_scores
    }

    #[must_use]
    pub fn speaking_recordings(&self) -> u32 {
        self.speaking_recordings
    }

    #[must_use]
    pub fn workbook_exercises_completed(&self) -> u32 {
        self.workbook_exercises_completed
    }

    #[must_use]
    pub fn modules_completed(&self) -> &[ModuleId] {
        &self.modules_completed
    }

    #[must_use]
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    #[must_use]
    pub fn perfect_quiz_count(&self) -> u32 {
        self.perfect_quiz_count
    }

    #[must_use]
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    #[must_use]
    pub fn has_completed_lesson(&self, id: &LessonId) -> bool {
        self.lessons_completed.contains(id)
    }

    #[must_use]
    pub fn has_completed_module(&self, id: &ModuleId) -> bool {
        self.modules_completed.contains(id)
    }

    // ─── Mutations ─────────────────────────────────────────────────────────────

    /// Adds `amount` to both the lifetime and the daily counters.
    pub fn credit_xp(&mut self, amount: u32) {
        self.total_xp = self.total_xp.saturating_add(amount);
        self.today_xp = self.today_xp.saturating_add(amount);
    }

    pub fn reset_today_xp(&mut self) {
        self.today_xp = 0;
    }

    /// Stamps a login for `day` with the already computed streak length.
    pub fn record_login(&mut self, day: NaiveDate, streak: u32) {
        self.last_login_date = Some(day);
        self.streak = streak;
    }

    /// Returns `false` if the lesson was already recorded.
    pub fn insert_lesson(&mut self, id: LessonId) -> bool {
        if self.has_completed_lesson(&id) {
            return false;
        }
        self.lessons_completed.push(id);
        true
    }

    /// Returns `false` if the module was already recorded.
    pub fn insert_module(&mut self, id: ModuleId) -> bool {
        if self.has_completed_module(&id) {
            return false;
        }
        self.modules_completed.push(id);
        true
    }

    /// Overwrites the score for `id`; a perfect score bumps the perfect counter.
    pub fn set_quiz_score(&mut self, id: QuizId, score: QuizScore) {
        self.quiz_scores.insert(id, score);
        if score.is_perfect() {
            self.perfect_quiz_count = self.perfect_quiz_count.saturating_add(1);
        }
    }

    pub fn increment_speaking_recordings(&mut self) {
        self.speaking_recordings = self.speaking_recordings.saturating_add(1);
    }

    pub fn increment_workbook_exercises(&mut self) {
        self.workbook_exercises_completed = self.workbook_exercises_completed.saturating_add(1);
    }

    /// Returns `false` if the badge was already unlocked.
    pub fn unlock_badge(&mut self, badge: Badge) -> bool {
        if self.has_badge(badge) {
            return false;
        }
        self.badges.push(badge);
        true
    }
}

//
// ─── LENIENT DESERIALIZERS ─────────────────────────────────────────────────────
//

/// Either a value of the expected type or anything else, which is skipped.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

impl<T> Lenient<T> {
    fn into_option(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

/// A stored quiz score before range checking.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScore {
    Whole(u64),
    Fraction(f64),
    Other(IgnoredAny),
}

impl StoredScore {
    /// Out-of-range entries are dropped; fractional ones round to the nearest
    /// whole percent.
    fn into_score(self) -> Option<QuizScore> {
        match self {
            Self::Whole(value) => u32::try_from(value)
                .ok()
                .and_then(|v| QuizScore::new(v).ok()),
            Self::Fraction(value) if (0.0..=100.0).contains(&value) => {
                // Range checked above, so the cast is exact.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let rounded = value.round() as u32;
                QuizScore::new(rounded).ok()
            }
            Self::Fraction(_) | Self::Other(_) => None,
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Lenient::<u32>::deserialize(deserializer)?
        .into_option()
        .unwrap_or_default())
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Lenient::<String>::deserialize(deserializer)?.into_option();
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Lenient::<Vec<Lenient<T>>>::deserialize(deserializer)?
        .into_option()
        .unwrap_or_default();
    Ok(raw.into_iter().filter_map(Lenient::into_option).collect())
}

fn unique_in_order<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + PartialEq,
{
    let mut out = Vec::new();
    for item in lenient_list::<D, T>(deserializer)? {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Ok(out)
}

fn known_badges<'de, D>(deserializer: D) -> Result<Vec<Badge>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient_list::<D, String>(deserializer)?;
    let mut out = Vec::with_capacity(raw.len());
    for badge in raw.iter().filter_map(|id| id.parse::<Badge>().ok()) {
        if !out.contains(&badge) {
            out.push(badge);
        }
    }
    Ok(out)
}

fn lenient_scores<'de, D>(deserializer: D) -> Result<BTreeMap<QuizId, QuizScore>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Lenient::<BTreeMap<QuizId, StoredScore>>::deserialize(deserializer)?
        .into_option()
        .unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(id, score)| score.into_score().map(|score| (id, score)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_empty() {
        let progress = UserProgress::default();
        assert_eq!(progress.total_xp(), 0);
        assert_eq!(progress.streak(), 0);
        assert!(progress.last_login_date().is_none());
        assert!(progress.badges().is_empty());
    }

    #[test]
    fn quiz_score_rejects_values_above_hundred() {
        assert!(QuizScore::new(100).unwrap().is_perfect());
        assert_eq!(QuizScore::new(0).unwrap().value(), 0);
        assert_eq!(
            QuizScore::new(101).unwrap_err(),
            ProgressModelError::ScoreOutOfRange(101)
        );
        assert_eq!(
            QuizScore::new(300).unwrap_err(),
            ProgressModelError::ScoreOutOfRange(300)
        );
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let mut progress = UserProgress::default();
        progress.credit_xp(25);
        progress.record_login(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(), 2);
        progress.insert_lesson(LessonId::new("l1"));
        progress.set_quiz_score(QuizId::new("q1"), QuizScore::new(80).unwrap());
        progress.unlock_badge(Badge::FirstFlame);

        let value = serde_json::to_value(&progress).unwrap();
        assert_eq!(value["totalXP"], 25);
        assert_eq!(value["todayXP"], 25);
        assert_eq!(value["streak"], 2);
        assert_eq!(value["lastLoginDate"], "2024-03-09");
        assert_eq!(value["lessonsCompleted"][0], "l1");
        assert_eq!(value["quizScores"]["q1"], 80);
        assert_eq!(value["speakingRecordings"], 0);
        assert_eq!(value["workbookExercisesCompleted"], 0);
        assert_eq!(value["modulesCompleted"].as_array().unwrap().len(), 0);
        assert_eq!(value["badges"][0], "first_flame");
        assert_eq!(value["perfectQuizCount"], 0);
    }

    #[test]
    fn tolerates_missing_and_unknown_fields() {
        let progress: UserProgress =
            serde_json::from_str(r#"{"totalXP": 120, "theme": "dark"}"#).unwrap();
        assert_eq!(progress.total_xp(), 120);
        assert_eq!(progress.today_xp(), 0);
        assert!(progress.lessons_completed().is_empty());
    }

    #[test]
    fn drops_unreadable_date_and_unknown_badges() {
        let progress: UserProgress = serde_json::from_str(
            r#"{
                "lastLoginDate": "Tue Nov 14 2023",
                "badges": ["first_flame", "mystery", "first_flame", "graduate"],
                "lessonsCompleted": ["a", "b", "a"]
            }"#,
        )
        .unwrap();
        assert!(progress.last_login_date().is_none());
        assert_eq!(progress.badges(), &[Badge::FirstFlame, Badge::Graduate]);
        assert_eq!(
            progress.lessons_completed(),
            &[LessonId::new("a"), LessonId::new("b")]
        );
    }

    #[test]
    fn bad_stored_scores_are_dropped_or_rounded() {
        let progress: UserProgress = serde_json::from_str(
            r#"{
                "totalXP": 4200,
                "quizScores": {"q1": 140, "q2": 87.5, "q3": -3, "q4": "ninety", "q5": 100}
            }"#,
        )
        .unwrap();
        let scores = progress.quiz_scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&QuizId::new("q2")].value(), 88);
        assert!(scores[&QuizId::new("q5")].is_perfect());
        assert_eq!(progress.total_xp(), 4200);
    }

    #[test]
    fn null_or_mistyped_fields_keep_the_rest_of_the_record() {
        let progress: UserProgress = serde_json::from_str(
            r#"{
                "totalXP": 4200,
                "todayXP": "many",
                "streak": null,
                "lastLoginDate": 20240309,
                "lessonsCompleted": ["a", 7, "b"],
                "modulesCompleted": null,
                "quizScores": [1, 2],
                "speakingRecordings": 2.5,
                "workbookExercisesCompleted": -1,
                "badges": ["first_flame", null],
                "perfectQuizCount": 3
            }"#,
        )
        .unwrap();
        assert_eq!(progress.total_xp(), 4200);
        assert_eq!(progress.today_xp(), 0);
        assert_eq!(progress.streak(), 0);
        assert!(progress.last_login_date().is_none());
        assert_eq!(
            progress.lessons_completed(),
            &[LessonId::new("a"), LessonId::new("b")]
        );
        assert!(progress.modules_completed().is_empty());
        assert!(progress.quiz_scores().is_empty());
        assert_eq!(progress.speaking_recordings(), 0);
        assert_eq!(progress.workbook_exercises_completed(), 0);
        assert_eq!(progress.badges(), &[Badge::FirstFlame]);
        assert_eq!(progress.perfect_quiz_count(), 3);
    }

    #[test]
    fn insertions_are_idempotent() {
        let mut progress = UserProgress::default();
        assert!(progress.insert_lesson(LessonId::new("l1")));
        assert!(!progress.insert_lesson(LessonId::new("l1")));
        assert!(progress.insert_module(ModuleId::new("m1")));
        assert!(!progress.insert_module(ModuleId::new("m1")));
        assert!(progress.unlock_badge(Badge::WeekWarrior));
        assert!(!progress.unlock_badge(Badge::WeekWarrior));
        assert_eq!(progress.lessons_completed().len(), 1);
        assert_eq!(progress.modules_completed().len(), 1);
        assert_eq!(progress.badges().len(), 1);
    }

    #[test]
    fn perfect_scores_count_every_submission() {
        let mut progress = UserProgress::default();
        progress.set_quiz_score(QuizId::new("q1"), QuizScore::PERFECT);
        progress.set_quiz_score(QuizId::new("q1"), QuizScore::PERFECT);
        progress.set_quiz_score(QuizId::new("q1"), QuizScore::new(40).unwrap());
        assert_eq!(progress.perfect_quiz_count(), 2);
        assert_eq!(progress.quiz_scores()[&QuizId::new("q1")].value(), 40);
    }

    #[test]
    fn xp_credit_saturates() {
        let mut progress = UserProgress::default();
        progress.credit_xp(u32::MAX);
        progress.credit_xp(10);
        assert_eq!(progress.total_xp(), u32::MAX);
        progress.reset_today_xp();
        assert_eq!(progress.today_xp(), 0);
        assert_eq!(progress.total_xp(), u32::MAX);
    }
}

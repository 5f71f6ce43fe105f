use std::sync::Arc;

use chrono::NaiveDate;
use learn_core::model::{LessonId, QuizId, QuizScore, UserProgress};
use learn_core::rewards::Badge;
use storage::progress_store::{PROGRESS_KEY, ProgressStore};
use storage::repository::{KeyValueRepository, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_key_value_roundtrip_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get_value("missing").await.unwrap(), None);

    repo.put_value("k", "first").await.unwrap();
    repo.put_value("k", "second").await.unwrap();
    assert_eq!(repo.get_value("k").await.unwrap().as_deref(), Some("second"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM key_value")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(versions, 1);
}

#[tokio::test]
async fn progress_store_persists_whole_record_in_sqlite() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_store?mode=memory&cache=shared")
        .await
        .expect("sqlite storage");
    let store = ProgressStore::new(Arc::clone(&storage.key_values));
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let mut progress = store.load(today).await.unwrap();
    assert_eq!(progress, UserProgress::default());

    progress.record_login(today, 3);
    progress.credit_xp(60);
    progress.insert_lesson(LessonId::new("greetings-1"));
    progress.set_quiz_score(QuizId::new("greetings-quiz"), QuizScore::PERFECT);
    progress.unlock_badge(Badge::FirstFlame);
    store.save(&progress).await.unwrap();

    let reloaded = store.load(today).await.unwrap();
    assert_eq!(reloaded, progress);

    let raw = storage
        .key_values
        .get_value(PROGRESS_KEY)
        .await
        .unwrap()
        .expect("stored json");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["totalXP"], 60);
    assert_eq!(value["lastLoginDate"], "2024-06-01");
    assert_eq!(value["badges"][0], "first_flame");
}

#[tokio::test]
async fn progress_store_recovers_from_corrupt_sqlite_value() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_corrupt?mode=memory&cache=shared")
        .await
        .expect("sqlite storage");
    storage
        .key_values
        .put_value(PROGRESS_KEY, "\"corrupt\"")
        .await
        .unwrap();

    let store = ProgressStore::new(Arc::clone(&storage.key_values));
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert_eq!(store.load(today).await.unwrap(), UserProgress::default());
}

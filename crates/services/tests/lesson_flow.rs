use std::sync::Arc;

use chrono::Duration;
use quest_core::model::{LessonMode, MemorizationProgress, UserId, VerseKey};
use quest_core::time::fixed_now;
use quest_services::{AppServices, Clock, LessonWindow, StaticVerseSource, StreakNotice};
use quest_storage::repository::Storage;

fn quran() -> Arc<StaticVerseSource> {
    Arc::new(
        StaticVerseSource::new()
            .with_surah(1, 7)
            .with_surah(2, 286)
            .with_surah(3, 200),
    )
}

fn memorized(window: &LessonWindow) -> MemorizationProgress {
    let mut reps = MemorizationProgress::new();
    for key in window.keys() {
        for _ in 0..3 {
            reps.record_repetition(key);
        }
    }
    reps
}

/// Services over shared storage with the clock advanced by `days`.
fn on_day(storage: &Storage, source: &Arc<StaticVerseSource>, days: i64) -> AppServices {
    let source: Arc<dyn quest_services::VerseSource> = source.clone();
    AppServices::with_storage(
        storage.clone(),
        Clock::fixed(fixed_now() + Duration::days(days)),
        source,
    )
}

#[tokio::test]
async fn a_week_of_daily_lessons_builds_a_streak() {
    let storage = Storage::in_memory();
    let source = quran();
    let user = UserId::new("aisha").unwrap();

    let mut expected_cursor = VerseKey::first();
    for day in 0..7_i64 {
        let services = on_day(&storage, &source, day);

        let snapshot = services.progress().load(&user).await.unwrap();
        assert_eq!(snapshot.streak_notice, None);
        assert_eq!(snapshot.progress.cursor(LessonMode::Read), expected_cursor);

        let window = services
            .lessons()
            .resolve_window(snapshot.progress.cursor(LessonMode::Read), 3)
            .await
            .unwrap();
        assert_eq!(window.len(), 3);

        let report = services
            .progress()
            .complete_lesson(&user, LessonMode::Read, &window, &MemorizationProgress::new())
            .await
            .unwrap();
        assert!(report.streak_incremented);
        assert_eq!(report.streak, u32::try_from(day).unwrap() + 1);

        expected_cursor = window.next_cursor();
    }

    // Seven lessons of three ayats walked the cursor across the boundary of
    // surah 1 (7 verses) into surah 2.
    assert_eq!(expected_cursor, VerseKey::new(2, 15).unwrap());
}

#[tokio::test]
async fn read_and_memorize_share_one_streak_but_not_cursors() {
    let storage = Storage::in_memory();
    let source = quran();
    let services = on_day(&storage, &source, 0);
    let user = UserId::new("umar").unwrap();

    let snapshot = services.progress().load(&user).await.unwrap();

    let read_window = services
        .lessons()
        .resolve_window(snapshot.progress.cursor(LessonMode::Read), 3)
        .await
        .unwrap();
    let read = services
        .progress()
        .complete_lesson(&user, LessonMode::Read, &read_window, &MemorizationProgress::new())
        .await
        .unwrap();
    assert_eq!(read.streak, 1);
    assert!(read.streak_incremented);

    let memorize_window = services
        .lessons()
        .resolve_window(snapshot.progress.cursor(LessonMode::Memorize), 3)
        .await
        .unwrap();
    let memorize = services
        .progress()
        .complete_lesson(
            &user,
            LessonMode::Memorize,
            &memorize_window,
            &memorized(&memorize_window),
        )
        .await
        .unwrap();

    // Same calendar day: the shared streak stays at one, while the memorize
    // side keeps its own cursor and counter.
    assert!(!memorize.streak_incremented);
    assert_eq!(memorize.streak, 1);
    assert_eq!(memorize.progress.total_verses_memorized(), 3);
    assert_eq!(memorize.progress.total_verses_completed(), 3);
    assert_eq!(
        memorize.progress.cursor(LessonMode::Memorize),
        VerseKey::new(1, 4).unwrap()
    );
}

#[tokio::test]
async fn a_missed_day_below_the_milestone_breaks_the_streak() {
    let storage = Storage::in_memory();
    let source = quran();
    let user = UserId::new("bilal").unwrap();

    let day_one = on_day(&storage, &source, 0);
    day_one.progress().load(&user).await.unwrap();
    let window = day_one
        .lessons()
        .resolve_window(VerseKey::first(), 3)
        .await
        .unwrap();
    day_one
        .progress()
        .complete_lesson(&user, LessonMode::Read, &window, &MemorizationProgress::new())
        .await
        .unwrap();

    // Two days later the lazy evaluation on load breaks the chain, once.
    let day_three = on_day(&storage, &source, 2);
    let snapshot = day_three.progress().load(&user).await.unwrap();
    assert_eq!(snapshot.streak_notice, Some(StreakNotice::Lost { previous: 1 }));
    assert_eq!(snapshot.progress.current_streak(), 0);
    assert_eq!(snapshot.progress.longest_streak(), 1);

    let again = day_three.progress().load(&user).await.unwrap();
    assert_eq!(again.streak_notice, None);
}

#[tokio::test]
async fn lesson_windows_tolerate_transient_content_failures() {
    let storage = Storage::in_memory();
    let source = Arc::new(
        StaticVerseSource::new()
            .with_surah(1, 7)
            .fail_at(VerseKey::new(1, 2).unwrap()),
    );
    let verse_source: Arc<dyn quest_services::VerseSource> = source.clone();
    let services = AppServices::with_storage(storage, Clock::fixed(fixed_now()), verse_source);
    let user = UserId::new("zaynab").unwrap();

    services.progress().load(&user).await.unwrap();
    let window = services
        .lessons()
        .resolve_window(VerseKey::first(), 3)
        .await
        .unwrap();

    // The failed slot degraded to placeholder text; the lesson still runs
    // and completes.
    assert_eq!(window.len(), 3);
    assert!(window.verses()[1].is_placeholder());

    let report = services
        .progress()
        .complete_lesson(&user, LessonMode::Read, &window, &MemorizationProgress::new())
        .await
        .unwrap();
    assert_eq!(report.verses_completed, 3);
    assert_eq!(
        report.progress.cursor(LessonMode::Read),
        VerseKey::new(1, 4).unwrap()
    );
}

use chrono::Duration;
use quest_core::model::{
    Comment, CommentId, Friendship, FriendshipStatus, LessonMode, SharedAyah, ThreadDraft,
    ThreadId, ThreadKind, UserId, UserProgress, VerseKey,
};
use quest_core::time::{fixed_now, fixed_today};
use quest_storage::repository::{ProgressRepository, SocialRepository, StorageError};
use quest_storage::sqlite::SqliteRepository;

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

fn completed_progress(streak: u32) -> UserProgress {
    UserProgress::from_persisted(
        VerseKey::new(2, 5).unwrap(),
        VerseKey::new(1, 4).unwrap(),
        3,
        streak,
        streak,
        Some(fixed_today()),
        Some(fixed_today() - Duration::days(1)),
        u64::from(streak) * 3,
        3,
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_the_progress_record() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = user("aisha");
    assert!(repo.read_progress(&id).await.unwrap().is_none());

    let progress = completed_progress(5);
    repo.create_progress(&id, &progress).await.unwrap();

    let loaded = repo.read_progress(&id).await.unwrap().expect("present");
    assert_eq!(loaded, progress);
    assert_eq!(loaded.cursor(LessonMode::Read), VerseKey::new(2, 5).unwrap());
    assert_eq!(loaded.last_completed_for(LessonMode::Read), Some(fixed_today()));
}

#[tokio::test]
async fn sqlite_create_twice_is_a_conflict() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_conflict?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = user("umar");
    let fresh = UserProgress::new_user(3).unwrap();
    repo.create_progress(&id, &fresh).await.unwrap();
    let err = repo.create_progress(&id, &fresh).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_guards_against_same_day_double_completion() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_guard?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = user("bilal");
    repo.create_progress(&id, &UserProgress::new_user(3).unwrap())
        .await
        .unwrap();

    let updated = completed_progress(1);
    repo.apply_completion(&id, LessonMode::Read, &updated, fixed_today())
        .await
        .unwrap();

    // A second session racing the same read completion must conflict, while
    // the memorize side of the same day still goes through.
    let err = repo
        .apply_completion(&id, LessonMode::Read, &updated, fixed_today())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let with_memorize = completed_progress(1);
    repo.apply_completion(&id, LessonMode::Memorize, &with_memorize, fixed_today())
        .await
        .expect("memorize mode is independently gated");
}

#[tokio::test]
async fn sqlite_reset_returns_to_defaults_but_keeps_lesson_size() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_reset?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = user("zaynab");
    let mut progress = completed_progress(7);
    progress.set_daily_ayats(10).unwrap();
    repo.create_progress(&id, &progress).await.unwrap();

    repo.reset_progress(&id).await.unwrap();
    let loaded = repo.read_progress(&id).await.unwrap().unwrap();
    assert_eq!(loaded.current_streak(), 0);
    assert_eq!(loaded.cursor(LessonMode::Read), VerseKey::first());
    assert_eq!(loaded.latest_completion(), None);
    assert_eq!(loaded.daily_ayats(), 10);
}

#[tokio::test]
async fn sqlite_leaderboard_orders_and_limits() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_board?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.create_progress(&user("low"), &UserProgress::new_user(3).unwrap())
        .await
        .unwrap();
    repo.create_progress(&user("high"), &completed_progress(9))
        .await
        .unwrap();
    repo.create_progress(&user("mid"), &completed_progress(4))
        .await
        .unwrap();

    let rows = repo.leaderboard(2).await.unwrap();
    let names: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(names, vec!["high", "mid"]);
}

#[tokio::test]
async fn sqlite_social_roundtrip() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_social?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let thread = ThreadDraft {
        author: user("aisha"),
        title: "A verse on gratitude".to_string(),
        content: "This one carried me through the week.".to_string(),
        kind: ThreadKind::AyahShare,
        shared_ayah: Some(SharedAyah {
            key: VerseKey::new(14, 7).unwrap(),
            arabic: "لَئِن شَكَرْتُمْ لَأَزِيدَنَّكُمْ".to_string(),
            translation: "If you are grateful, I will surely increase you.".to_string(),
        }),
    }
    .validate(ThreadId::generate(), fixed_now())
    .unwrap();

    repo.insert_thread(&thread).await.unwrap();
    let listed = repo.list_threads(10).await.unwrap();
    assert_eq!(listed, vec![thread.clone()]);

    // Comments attach only to existing threads; the foreign key enforces it.
    let orphan = Comment::new(
        CommentId::generate(),
        ThreadId::generate(),
        user("umar"),
        "beautiful",
        fixed_now(),
    )
    .unwrap();
    assert!(matches!(
        repo.insert_comment(&orphan).await.unwrap_err(),
        StorageError::NotFound
    ));

    let comment = Comment::new(
        CommentId::generate(),
        thread.id,
        user("umar"),
        "beautiful",
        fixed_now(),
    )
    .unwrap();
    repo.insert_comment(&comment).await.unwrap();
    assert_eq!(
        repo.comments_for_thread(thread.id).await.unwrap(),
        vec![comment]
    );
}

#[tokio::test]
async fn sqlite_friendship_upsert_and_lookup() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_friends?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let edge = Friendship::request(user("aisha"), user("umar"), fixed_now());
    repo.upsert_friendship(&edge).await.unwrap();

    let found = repo
        .friendship_between(&user("umar"), &user("aisha"))
        .await
        .unwrap()
        .expect("edge exists in either direction");
    assert_eq!(found.status, FriendshipStatus::Pending);

    let mut accepted = edge.clone();
    accepted.status = FriendshipStatus::Accepted;
    accepted.updated_at = fixed_now() + Duration::hours(1);
    repo.upsert_friendship(&accepted).await.unwrap();

    let edges = repo.friendships_for(&user("aisha")).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].status, FriendshipStatus::Accepted);
}

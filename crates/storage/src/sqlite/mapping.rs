use chrono::NaiveDate;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use quest_core::model::{
    Comment, CommentId, Friendship, FriendshipStatus, SharedAyah, Thread, ThreadId, ThreadKind,
    UserId, UserProgress, VerseKey,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u16_col(row: &SqliteRow, name: &str) -> Result<u16, StorageError> {
    let raw: i64 = row.try_get(name).map_err(ser)?;
    u16::try_from(raw).map_err(|_| StorageError::Serialization(format!("{name} out of range")))
}

pub(crate) fn u32_col(row: &SqliteRow, name: &str) -> Result<u32, StorageError> {
    let raw: i64 = row.try_get(name).map_err(ser)?;
    u32::try_from(raw).map_err(|_| StorageError::Serialization(format!("{name} out of range")))
}

pub(crate) fn u64_col(row: &SqliteRow, name: &str) -> Result<u64, StorageError> {
    let raw: i64 = row.try_get(name).map_err(ser)?;
    u64::try_from(raw).map_err(|_| StorageError::Serialization(format!("{name} out of range")))
}

pub(crate) fn verse_key_cols(
    row: &SqliteRow,
    surah_col: &str,
    ayah_col: &str,
) -> Result<VerseKey, StorageError> {
    VerseKey::new(u16_col(row, surah_col)?, u16_col(row, ayah_col)?).map_err(ser)
}

pub(crate) fn user_id_col(row: &SqliteRow, name: &str) -> Result<UserId, StorageError> {
    UserId::new(row.try_get::<String, _>(name).map_err(ser)?).map_err(ser)
}

pub(crate) fn progress_from_row(row: &SqliteRow) -> Result<UserProgress, StorageError> {
    UserProgress::from_persisted(
        verse_key_cols(row, "read_surah", "read_ayah")?,
        verse_key_cols(row, "memorize_surah", "memorize_ayah")?,
        u16_col(row, "daily_ayats")?,
        u32_col(row, "current_streak")?,
        u32_col(row, "longest_streak")?,
        row.try_get::<Option<NaiveDate>, _>("last_completed")
            .map_err(ser)?,
        row.try_get::<Option<NaiveDate>, _>("memorize_last_completed")
            .map_err(ser)?,
        u64_col(row, "total_verses_completed")?,
        u64_col(row, "total_verses_memorized")?,
    )
    .map_err(ser)
}

pub(crate) fn thread_from_row(row: &SqliteRow) -> Result<Thread, StorageError> {
    let id: ThreadId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let kind = ThreadKind::parse_lossy(row.try_get::<String, _>("kind").map_err(ser)?.as_str());

    let shared_ayah = match (
        row.try_get::<Option<i64>, _>("ayah_surah").map_err(ser)?,
        row.try_get::<Option<i64>, _>("ayah_number").map_err(ser)?,
    ) {
        (Some(surah), Some(ayah)) => {
            let surah = u16::try_from(surah)
                .map_err(|_| StorageError::Serialization("ayah_surah out of range".into()))?;
            let ayah = u16::try_from(ayah)
                .map_err(|_| StorageError::Serialization("ayah_number out of range".into()))?;
            Some(SharedAyah {
                key: VerseKey::new(surah, ayah).map_err(ser)?,
                arabic: row
                    .try_get::<Option<String>, _>("ayah_arabic")
                    .map_err(ser)?
                    .unwrap_or_default(),
                translation: row
                    .try_get::<Option<String>, _>("ayah_translation")
                    .map_err(ser)?
                    .unwrap_or_default(),
            })
        }
        _ => None,
    };

    Ok(Thread {
        id,
        author: user_id_col(row, "author")?,
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        kind,
        shared_ayah,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn comment_from_row(row: &SqliteRow) -> Result<Comment, StorageError> {
    let id: CommentId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let thread_id: ThreadId = row
        .try_get::<String, _>("thread_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    Comment::new(
        id,
        thread_id,
        user_id_col(row, "author")?,
        row.try_get::<String, _>("content").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn friendship_from_row(row: &SqliteRow) -> Result<Friendship, StorageError> {
    Ok(Friendship {
        requester: user_id_col(row, "requester")?,
        addressee: user_id_col(row, "addressee")?,
        status: FriendshipStatus::parse(row.try_get::<String, _>("status").map_err(ser)?.as_str())
            .map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

use chrono::NaiveDate;
use quest_core::model::{LessonMode, UserId, UserProgress};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{progress_from_row, ser};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "user_id, read_surah, read_ayah, memorize_surah, memorize_ayah, \
     daily_ayats, current_streak, longest_streak, last_completed, memorize_last_completed, \
     total_verses_completed, total_verses_memorized";

fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => StorageError::Connection(e.to_string()),
    }
}

fn i64_from_u64(value: u64, what: &str) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|_| StorageError::Serialization(format!("{what} overflow")))
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn read_progress(&self, user: &UserId) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = ?1"
        ))
        .bind(user.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => progress_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn create_progress(
        &self,
        user: &UserId,
        progress: &UserProgress,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, read_surah, read_ayah, memorize_surah, memorize_ayah,
                daily_ayats, current_streak, longest_streak, last_completed, memorize_last_completed,
                total_verses_completed, total_verses_memorized)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(progress.cursor(LessonMode::Read).surah()))
        .bind(i64::from(progress.cursor(LessonMode::Read).ayah()))
        .bind(i64::from(progress.cursor(LessonMode::Memorize).surah()))
        .bind(i64::from(progress.cursor(LessonMode::Memorize).ayah()))
        .bind(i64::from(progress.daily_ayats()))
        .bind(i64::from(progress.current_streak()))
        .bind(i64::from(progress.longest_streak()))
        .bind(progress.last_completed_for(LessonMode::Read))
        .bind(progress.last_completed_for(LessonMode::Memorize))
        .bind(i64_from_u64(progress.total_verses_completed(), "total_verses_completed")?)
        .bind(i64_from_u64(progress.total_verses_memorized(), "total_verses_memorized")?)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn apply_completion(
        &self,
        user: &UserId,
        mode: LessonMode,
        updated: &UserProgress,
        today: NaiveDate,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        // Guard inside the transaction: re-read the mode's completion date so
        // a second session finishing the same lesson surfaces as Conflict
        // rather than silently overwriting the first write.
        let row = sqlx::query(
            "SELECT last_completed, memorize_last_completed FROM user_progress WHERE user_id = ?1",
        )
        .bind(user.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StorageError::NotFound)?;

        let column = match mode {
            LessonMode::Read => "last_completed",
            LessonMode::Memorize => "memorize_last_completed",
        };
        let stored: Option<NaiveDate> = row.try_get(column).map_err(ser)?;
        if stored == Some(today) {
            return Err(StorageError::Conflict);
        }

        sqlx::query(
            r"
            UPDATE user_progress SET
                read_surah = ?2,
                read_ayah = ?3,
                memorize_surah = ?4,
                memorize_ayah = ?5,
                daily_ayats = ?6,
                current_streak = ?7,
                longest_streak = ?8,
                last_completed = ?9,
                memorize_last_completed = ?10,
                total_verses_completed = ?11,
                total_verses_memorized = ?12
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(updated.cursor(LessonMode::Read).surah()))
        .bind(i64::from(updated.cursor(LessonMode::Read).ayah()))
        .bind(i64::from(updated.cursor(LessonMode::Memorize).surah()))
        .bind(i64::from(updated.cursor(LessonMode::Memorize).ayah()))
        .bind(i64::from(updated.daily_ayats()))
        .bind(i64::from(updated.current_streak()))
        .bind(i64::from(updated.longest_streak()))
        .bind(updated.last_completed_for(LessonMode::Read))
        .bind(updated.last_completed_for(LessonMode::Memorize))
        .bind(i64_from_u64(updated.total_verses_completed(), "total_verses_completed")?)
        .bind(i64_from_u64(updated.total_verses_memorized(), "total_verses_memorized")?)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn save_streak_reset(
        &self,
        user: &UserId,
        updated: &UserProgress,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE user_progress SET current_streak = ?2, longest_streak = ?3 WHERE user_id = ?1",
        )
        .bind(user.as_str())
        .bind(i64::from(updated.current_streak()))
        .bind(i64::from(updated.longest_streak()))
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_daily_ayats(
        &self,
        user: &UserId,
        daily_ayats: u16,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE user_progress SET daily_ayats = ?2 WHERE user_id = ?1")
            .bind(user.as_str())
            .bind(i64::from(daily_ayats))
            .execute(self.pool())
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn reset_progress(&self, user: &UserId) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            UPDATE user_progress SET
                read_surah = 1, read_ayah = 1,
                memorize_surah = 1, memorize_ayah = 1,
                current_streak = 0, longest_streak = 0,
                last_completed = NULL, memorize_last_completed = NULL,
                total_verses_completed = 0, total_verses_memorized = 0
            WHERE user_id = ?1
            ",
        )
        .bind(user.as_str())
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<(UserId, UserProgress)>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress
             ORDER BY current_streak DESC, longest_streak DESC,
                      total_verses_completed DESC, user_id ASC
             LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let user = super::mapping::user_id_col(&row, "user_id")?;
            entries.push((user, progress_from_row(&row)?));
        }
        Ok(entries)
    }
}

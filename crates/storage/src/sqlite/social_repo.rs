use quest_core::model::{Comment, Friendship, Thread, ThreadId, UserId};

use super::SqliteRepository;
use super::mapping::{comment_from_row, friendship_from_row, thread_from_row};
use crate::repository::{SocialRepository, StorageError};

fn db_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => StorageError::Connection(e.to_string()),
    }
}

const THREAD_COLUMNS: &str =
    "id, author, title, content, kind, ayah_surah, ayah_number, ayah_arabic, ayah_translation, created_at";

#[async_trait::async_trait]
impl SocialRepository for SqliteRepository {
    async fn insert_thread(&self, thread: &Thread) -> Result<(), StorageError> {
        let (ayah_surah, ayah_number, ayah_arabic, ayah_translation) = match &thread.shared_ayah {
            Some(ayah) => (
                Some(i64::from(ayah.key.surah())),
                Some(i64::from(ayah.key.ayah())),
                Some(ayah.arabic.clone()),
                Some(ayah.translation.clone()),
            ),
            None => (None, None, None, None),
        };

        sqlx::query(
            r"
            INSERT INTO threads (id, author, title, content, kind, ayah_surah, ayah_number,
                ayah_arabic, ayah_translation, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(thread.id.to_string())
        .bind(thread.author.as_str())
        .bind(&thread.title)
        .bind(&thread.content)
        .bind(thread.kind.as_str())
        .bind(ayah_surah)
        .bind(ayah_number)
        .bind(ayah_arabic)
        .bind(ayah_translation)
        .bind(thread.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_threads(&self, limit: u32) -> Result<Vec<Thread>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        let mut threads = Vec::with_capacity(rows.len());
        for row in rows {
            threads.push(thread_from_row(&row)?);
        }
        Ok(threads)
    }

    async fn get_thread(&self, id: ThreadId) -> Result<Option<Thread>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => thread_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO comments (id, thread_id, author, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(comment.id.to_string())
        .bind(comment.thread_id.to_string())
        .bind(comment.author.as_str())
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(self.pool())
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn comments_for_thread(&self, thread: ThreadId) -> Result<Vec<Comment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, thread_id, author, content, created_at
            FROM comments WHERE thread_id = ?1
            ORDER BY created_at ASC
            ",
        )
        .bind(thread.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            comments.push(comment_from_row(&row)?);
        }
        Ok(comments)
    }

    async fn upsert_friendship(&self, friendship: &Friendship) -> Result<(), StorageError> {
        // The edge is unique per unordered pair; the reversed direction is
        // cleared so a re-request after a response cannot leave two rows.
        let mut tx = self.pool().begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM friendships WHERE requester = ?1 AND addressee = ?2")
            .bind(friendship.addressee.as_str())
            .bind(friendship.requester.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO friendships (requester, addressee, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(requester, addressee) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            ",
        )
        .bind(friendship.requester.as_str())
        .bind(friendship.addressee.as_str())
        .bind(friendship.status.as_str())
        .bind(friendship.created_at)
        .bind(friendship.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn friendship_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT requester, addressee, status, created_at, updated_at
            FROM friendships
            WHERE (requester = ?1 AND addressee = ?2) OR (requester = ?2 AND addressee = ?1)
            ",
        )
        .bind(a.as_str())
        .bind(b.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => friendship_from_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn friendships_for(&self, user: &UserId) -> Result<Vec<Friendship>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT requester, addressee, status, created_at, updated_at
            FROM friendships
            WHERE requester = ?1 OR addressee = ?1
            ORDER BY created_at ASC
            ",
        )
        .bind(user.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(db_err)?;

        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            edges.push(friendship_from_row(&row)?);
        }
        Ok(edges)
    }
}

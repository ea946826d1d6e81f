use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CommentId, ThreadId, UserId};
use crate::model::verse::VerseKey;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ThreadError {
    #[error("thread title must not be empty")]
    EmptyTitle,
    #[error("thread content must not be empty")]
    EmptyContent,
    #[error("ayah-share threads must carry the shared ayah")]
    MissingSharedAyah,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommentError {
    #[error("comment content must not be empty")]
    EmptyContent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FriendshipError {
    #[error("unknown friendship status: {0:?}")]
    UnknownStatus(String),
}

//
// ─── THREADS ───────────────────────────────────────────────────────────────────
//

/// What a community thread is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadKind {
    /// Free-form discussion.
    Discussion,
    /// A shared ayah with the author's reflection on it.
    AyahShare,
}

impl ThreadKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThreadKind::Discussion => "discussion",
            ThreadKind::AyahShare => "ayah-share",
        }
    }

    /// Parses the persisted textual form; anything unknown maps to
    /// `Discussion` so old rows keep loading.
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        match value {
            "ayah-share" => ThreadKind::AyahShare,
            _ => ThreadKind::Discussion,
        }
    }
}

/// The ayah attached to an ayah-share thread, with its text captured at
/// share time so the thread renders without a content-source round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedAyah {
    pub key: VerseKey,
    pub arabic: String,
    pub translation: String,
}

/// Unvalidated thread input as it arrives from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadDraft {
    pub author: UserId,
    pub title: String,
    pub content: String,
    pub kind: ThreadKind,
    pub shared_ayah: Option<SharedAyah>,
}

impl ThreadDraft {
    /// Validates the draft and stamps identity and creation time.
    ///
    /// # Errors
    ///
    /// Returns `ThreadError` when title or content is blank, or when an
    /// ayah-share draft is missing its ayah.
    pub fn validate(self, id: ThreadId, now: DateTime<Utc>) -> Result<Thread, ThreadError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ThreadError::EmptyTitle);
        }
        let content = self.content.trim().to_string();
        if content.is_empty() {
            return Err(ThreadError::EmptyContent);
        }
        if self.kind == ThreadKind::AyahShare && self.shared_ayah.is_none() {
            return Err(ThreadError::MissingSharedAyah);
        }

        Ok(Thread {
            id,
            author: self.author,
            title,
            content,
            kind: self.kind,
            shared_ayah: self.shared_ayah,
            created_at: now,
        })
    }
}

/// A community thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub author: UserId,
    pub title: String,
    pub content: String,
    pub kind: ThreadKind,
    pub shared_ayah: Option<SharedAyah>,
    pub created_at: DateTime<Utc>,
}

//
// ─── COMMENTS ──────────────────────────────────────────────────────────────────
//

/// A comment under a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub thread_id: ThreadId,
    pub author: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Validates comment content and builds the comment.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::EmptyContent` when the content is blank.
    pub fn new(
        id: CommentId,
        thread_id: ThreadId,
        author: UserId,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CommentError> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Err(CommentError::EmptyContent);
        }
        Ok(Self {
            id,
            thread_id,
            author,
            content,
            created_at: now,
        })
    }
}

//
// ─── FRIENDSHIPS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        }
    }

    /// Parses the persisted textual form.
    ///
    /// # Errors
    ///
    /// Returns `FriendshipError::UnknownStatus` for anything unrecognized.
    pub fn parse(value: &str) -> Result<Self, FriendshipError> {
        match value {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            "blocked" => Ok(FriendshipStatus::Blocked),
            other => Err(FriendshipError::UnknownStatus(other.to_string())),
        }
    }
}

/// Directed friendship edge: `requester` asked, `addressee` answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub requester: UserId,
    pub addressee: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// A fresh pending request.
    #[must_use]
    pub fn request(requester: UserId, addressee: UserId, now: DateTime<Utc>) -> Self {
        Self {
            requester,
            addressee,
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// True if the given user is either end of this edge.
    #[must_use]
    pub fn involves(&self, user: &UserId) -> bool {
        &self.requester == user || &self.addressee == user
    }

    /// The end of the edge that is not the given user, if any.
    #[must_use]
    pub fn other_party(&self, user: &UserId) -> Option<&UserId> {
        if &self.requester == user {
            Some(&self.addressee)
        } else if &self.addressee == user {
            Some(&self.requester)
        } else {
            None
        }
    }
}

//
// ─── LEADERBOARD ───────────────────────────────────────────────────────────────
//

/// One ranked row of the community leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user: UserId,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_verses_completed: u64,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    #[test]
    fn draft_trims_and_validates() {
        let draft = ThreadDraft {
            author: user("aisha"),
            title: "  Reflections on patience  ".to_string(),
            content: "Sabr comes up again and again in this week's reading.".to_string(),
            kind: ThreadKind::Discussion,
            shared_ayah: None,
        };
        let thread = draft.validate(ThreadId::generate(), fixed_now()).unwrap();
        assert_eq!(thread.title, "Reflections on patience");
    }

    #[test]
    fn blank_title_or_content_is_rejected() {
        let base = ThreadDraft {
            author: user("aisha"),
            title: " ".to_string(),
            content: "text".to_string(),
            kind: ThreadKind::Discussion,
            shared_ayah: None,
        };
        assert!(matches!(
            base.clone().validate(ThreadId::generate(), fixed_now()),
            Err(ThreadError::EmptyTitle)
        ));

        let mut no_content = base;
        no_content.title = "title".to_string();
        no_content.content = "   ".to_string();
        assert!(matches!(
            no_content.validate(ThreadId::generate(), fixed_now()),
            Err(ThreadError::EmptyContent)
        ));
    }

    #[test]
    fn ayah_share_requires_the_ayah() {
        let draft = ThreadDraft {
            author: user("umar"),
            title: "A verse that stopped me".to_string(),
            content: "Read this slowly.".to_string(),
            kind: ThreadKind::AyahShare,
            shared_ayah: None,
        };
        assert!(matches!(
            draft.validate(ThreadId::generate(), fixed_now()),
            Err(ThreadError::MissingSharedAyah)
        ));
    }

    #[test]
    fn comment_rejects_blank_content() {
        let err = Comment::new(
            CommentId::generate(),
            ThreadId::generate(),
            user("umar"),
            "  ",
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, CommentError::EmptyContent));
    }

    #[test]
    fn friendship_edges_know_their_parties() {
        let edge = Friendship::request(user("aisha"), user("umar"), fixed_now());
        assert_eq!(edge.status, FriendshipStatus::Pending);
        assert!(edge.involves(&user("aisha")));
        assert_eq!(edge.other_party(&user("umar")), Some(&user("aisha")));
        assert_eq!(edge.other_party(&user("bilal")), None);
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            FriendshipStatus::Pending,
            FriendshipStatus::Accepted,
            FriendshipStatus::Blocked,
        ] {
            assert_eq!(FriendshipStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(FriendshipStatus::parse("rivals").is_err());
    }
}

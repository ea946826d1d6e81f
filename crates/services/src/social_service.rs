use std::sync::Arc;

use tracing::info;

use quest_core::model::{
    Comment, CommentId, Friendship, FriendshipStatus, LeaderboardEntry, Thread, ThreadDraft,
    ThreadId, UserId,
};
use quest_core::time::Clock;
use quest_storage::repository::{ProgressRepository, SocialRepository};

use crate::error::SocialServiceError;

/// Community features: threads, comments, friendships, and the leaderboard.
pub struct SocialService {
    clock: Clock,
    social: Arc<dyn SocialRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl SocialService {
    #[must_use]
    pub fn new(
        clock: Clock,
        social: Arc<dyn SocialRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            social,
            progress,
        }
    }

    /// Validate and publish a new thread.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::Thread` for an invalid draft and
    /// `SocialServiceError::Storage` for repository failures.
    pub async fn create_thread(&self, draft: ThreadDraft) -> Result<Thread, SocialServiceError> {
        let thread = draft.validate(ThreadId::generate(), self.clock.now())?;
        self.social.insert_thread(&thread).await?;
        info!(thread = %thread.id, author = %thread.author, "thread created");
        Ok(thread)
    }

    /// Newest threads first.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::Storage` for repository failures.
    pub async fn list_threads(&self, limit: u32) -> Result<Vec<Thread>, SocialServiceError> {
        Ok(self.social.list_threads(limit).await?)
    }

    /// Add a comment under an existing thread.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::ThreadNotFound` if the thread is missing
    /// and `SocialServiceError::Comment` for blank content.
    pub async fn add_comment(
        &self,
        thread_id: ThreadId,
        author: UserId,
        content: &str,
    ) -> Result<Comment, SocialServiceError> {
        if self.social.get_thread(thread_id).await?.is_none() {
            return Err(SocialServiceError::ThreadNotFound);
        }

        let comment = Comment::new(
            CommentId::generate(),
            thread_id,
            author,
            content,
            self.clock.now(),
        )?;
        self.social.insert_comment(&comment).await?;
        Ok(comment)
    }

    /// Comments for a thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::Storage` for repository failures.
    pub async fn comments(&self, thread_id: ThreadId) -> Result<Vec<Comment>, SocialServiceError> {
        Ok(self.social.comments_for_thread(thread_id).await?)
    }

    /// Send a friend request.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::SelfFriendship` for a self-request and
    /// `SocialServiceError::DuplicateFriendship` when any edge already
    /// exists between the two users.
    pub async fn send_friend_request(
        &self,
        requester: UserId,
        addressee: UserId,
    ) -> Result<Friendship, SocialServiceError> {
        if requester == addressee {
            return Err(SocialServiceError::SelfFriendship);
        }
        if self
            .social
            .friendship_between(&requester, &addressee)
            .await?
            .is_some()
        {
            return Err(SocialServiceError::DuplicateFriendship);
        }

        let friendship = Friendship::request(requester, addressee, self.clock.now());
        self.social.upsert_friendship(&friendship).await?;
        Ok(friendship)
    }

    /// Accept or block a pending request addressed to `addressee`.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::NoPendingRequest` unless a pending edge
    /// from `requester` to `addressee` exists.
    pub async fn respond_to_request(
        &self,
        requester: &UserId,
        addressee: &UserId,
        accept: bool,
    ) -> Result<Friendship, SocialServiceError> {
        let mut edge = self
            .social
            .friendship_between(requester, addressee)
            .await?
            .ok_or(SocialServiceError::NoPendingRequest)?;

        // Only the addressee of the original pending request may answer it.
        if edge.status != FriendshipStatus::Pending
            || &edge.requester != requester
            || &edge.addressee != addressee
        {
            return Err(SocialServiceError::NoPendingRequest);
        }

        edge.status = if accept {
            FriendshipStatus::Accepted
        } else {
            FriendshipStatus::Blocked
        };
        edge.updated_at = self.clock.now();
        self.social.upsert_friendship(&edge).await?;
        Ok(edge)
    }

    /// Accepted friends of a user.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::Storage` for repository failures.
    pub async fn friends_of(&self, user: &UserId) -> Result<Vec<UserId>, SocialServiceError> {
        let edges = self.social.friendships_for(user).await?;
        Ok(edges
            .into_iter()
            .filter(|edge| edge.status == FriendshipStatus::Accepted)
            .filter_map(|edge| edge.other_party(user).cloned())
            .collect())
    }

    /// The community leaderboard with dense ranks assigned.
    ///
    /// # Errors
    ///
    /// Returns `SocialServiceError::Storage` for repository failures.
    pub async fn leaderboard(
        &self,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, SocialServiceError> {
        let rows = self.progress.leaderboard(limit).await?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(index, (user, progress))| LeaderboardEntry {
                rank: u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1),
                user,
                current_streak: progress.current_streak(),
                longest_streak: progress.longest_streak(),
                total_verses_completed: progress.total_verses_completed(),
            })
            .collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

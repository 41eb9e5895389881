//! Vote storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid page number: {page} (pages start at 1)")]
    InvalidPage { page: u64 },

    #[error("user {user} already cast this vote on post {post}")]
    AlreadyVoted { post: String, user: String },

    #[error("voting window closed for post {post}")]
    VoteWindowClosed { post: String },

    #[error("post not found: {post}")]
    PostNotFound { post: String },

    #[error("corrupt record at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Direction of a vote. Anything else is rejected at the call boundary
/// before touching storage, so invalid directions are unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The stored vote value: +1 for up, -1 for down.
    pub fn value(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// What an accepted cast did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First active vote from this user on this post.
    First,
    /// Existing vote reversed to the opposite direction.
    Reversed,
}

/// Input to post-projection creation.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub summary: String,
    pub community_id: String,
    pub created_at: DateTime<Utc>,
}

/// Interface for vote state and score aggregation.
///
/// Both operations are single atomic units: either every constituent write
/// lands or none does. Callers never mutate index or score state directly.
///
/// # Implementations
///
/// - `RedisVoteStore`: Redis storage (Lua vote unit, MULTI creation pipeline)
/// - `MemoryStore`: in-memory storage for tests and embedded use
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Cast a vote from `user` on `post`.
    ///
    /// The read of the previous vote value, the transition decision, and
    /// all resulting writes (voter record, score index, info record, dedup
    /// marker) execute as one atomic unit. Re-casting an identical vote
    /// yields `StoreError::AlreadyVoted`; casting the opposite direction
    /// reverses the vote.
    async fn cast_vote(&self, post: &str, user: &str, direction: Direction)
        -> Result<VoteOutcome>;

    /// Create the denormalized listing projection for a new post.
    ///
    /// Atomically inserts the info record (votes=0, score=0), the score and
    /// time index entries, the community membership entry, and the voter
    /// record seeded with the author at value 0. Partial application is
    /// never observable.
    async fn create_post(&self, post: &NewPost) -> Result<()>;
}

//! Paginated post read interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::vote_store::Result;

/// Which global index a read is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Descending by aggregate score.
    Score,
    /// Descending by creation time.
    Time,
}

impl OrderKind {
    /// Stable name used in cache keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderKind::Score => "score",
            OrderKind::Time => "time",
        }
    }
}

/// Policy for index entries whose info record is missing or expired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationPolicy {
    /// Degrade to a summary with only the id set (the reference behavior).
    #[default]
    Partial,
    /// Fail the whole page with `StoreError::PostNotFound`.
    Strict,
}

/// Denormalized listing projection of a post.
///
/// This is a read-side copy for fast listing; the relational store remains
/// the source of truth for post content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub author_id: String,
    pub community_id: String,
    /// Creation time as unix seconds.
    pub created_at: i64,
    /// Count of active up-votes.
    pub votes: i64,
    /// Aggregate score (vote weight times net active votes).
    pub score: f64,
}

impl PostSummary {
    /// Summary for an id whose info record is gone (partial hydration).
    pub fn unhydrated(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

/// Interface for paginated, ordered post reads.
///
/// Pages are a pure function of `(page, page_size)`: no iterator state is
/// retained between calls, pages are disjoint, and their union over all
/// pages is the full index. Callers validate `page >= 1` before calling.
///
/// # Implementations
///
/// - `RedisPostReader`: Redis storage (ZREVRANGE + HGETALL hydration)
/// - `MemoryStore`: in-memory storage for tests and embedded use
#[async_trait]
pub trait PostReader: Send + Sync {
    /// Read one page of the global index for `order`, descending.
    async fn list_posts(&self, order: OrderKind, page: u64) -> Result<Vec<PostSummary>>;

    /// Read one page of the community-scoped index for `order`, descending.
    ///
    /// The scoped index is the intersection of the community's membership
    /// set with the chosen global index (aggregate rule MAX), cached with a
    /// bounded TTL. Staleness within the TTL window is by design.
    async fn list_community_posts(
        &self,
        community: &str,
        order: OrderKind,
        page: u64,
    ) -> Result<Vec<PostSummary>>;
}

//! Board facade: the engine's external surface.
//!
//! The transport layer maps requests onto these operations. The facade
//! validates inputs (page numbers; directions are already an enum and
//! malformed values never reach this far) before touching storage, then
//! delegates to the configured backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::error;

use crate::config::Config;
use crate::interfaces::{
    Direction, NewPost, OrderKind, PostReader, PostSummary, Result, StoreError, VoteOutcome,
    VoteStore,
};
use crate::ranking::{strategy_from_config, RankingStrategy};
use crate::storage;

/// Vote-and-ranking engine over a storage backend pair.
pub struct Board {
    store: Arc<dyn VoteStore>,
    reader: Arc<dyn PostReader>,
    ranking: Box<dyn RankingStrategy>,
}

impl Board {
    /// Build a board over explicit backend handles.
    pub fn new(store: Arc<dyn VoteStore>, reader: Arc<dyn PostReader>, config: &Config) -> Self {
        Self {
            store,
            reader,
            ranking: strategy_from_config(&config.ranking),
        }
    }

    /// Build a board with backends selected by configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (store, reader) = storage::init_storage(config).await?;
        Ok(Self::new(store, reader, config))
    }

    /// Cast a vote from `user` on `post`. Identical re-casts are rejected;
    /// opposite-direction casts reverse the vote.
    pub async fn cast_vote(
        &self,
        post: &str,
        user: &str,
        direction: Direction,
    ) -> Result<VoteOutcome> {
        let outcome = self.store.cast_vote(post, user, direction).await;
        if let Err(err) = &outcome {
            match err {
                StoreError::AlreadyVoted { .. } | StoreError::VoteWindowClosed { .. } => {}
                other => error!(post = %post, user = %user, error = %other, "cast_vote failed"),
            }
        }
        outcome
    }

    /// Create the listing projection for a new post, stamped with now.
    pub async fn create_post(
        &self,
        post: &str,
        author: &str,
        title: &str,
        summary: &str,
        community: &str,
    ) -> Result<()> {
        self.create_post_at(post, author, title, summary, community, Utc::now())
            .await
    }

    /// Create the listing projection with an explicit creation time.
    /// Backfills and tests need the timestamp deterministic.
    pub async fn create_post_at(
        &self,
        post: &str,
        author: &str,
        title: &str,
        summary: &str,
        community: &str,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .create_post(&NewPost {
                id: post.to_string(),
                author_id: author.to_string(),
                title: title.to_string(),
                summary: summary.to_string(),
                community_id: community.to_string(),
                created_at,
            })
            .await
    }

    /// One page of the global listing, descending by `order`.
    pub async fn list_posts(&self, order: OrderKind, page: u64) -> Result<Vec<PostSummary>> {
        Self::validate_page(page)?;
        self.reader.list_posts(order, page).await
    }

    /// One page of a community-scoped listing, descending by `order`.
    pub async fn list_community_posts(
        &self,
        community: &str,
        order: OrderKind,
        page: u64,
    ) -> Result<Vec<PostSummary>> {
        Self::validate_page(page)?;
        self.reader.list_community_posts(community, order, page).await
    }

    /// Score a post with the configured ranking strategy.
    pub fn rank(&self, upvotes: i64, downvotes: i64, created_at: DateTime<Utc>) -> f64 {
        self.ranking.score(upvotes, downvotes, created_at)
    }

    fn validate_page(page: u64) -> Result<()> {
        if page < 1 {
            return Err(StoreError::InvalidPage { page });
        }
        Ok(())
    }
}

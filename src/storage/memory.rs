//! In-memory storage backend.
//!
//! Implements both storage traits over plain maps behind a single RwLock,
//! so every operation is trivially one atomic unit. No external deps: this
//! is the backend for tests and embedded use. It mirrors the Redis
//! backend's semantics, including zset tie-breaking (descending value,
//! then descending id) and the MAX aggregation of scoped intersections.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::interfaces::{
    Direction, HydrationPolicy, NewPost, OrderKind, PostReader, PostSummary, Result, StoreError,
    VoteOutcome, VoteStore,
};
use crate::vote;

#[derive(Default)]
struct Inner {
    /// postID -> listing projection.
    info: HashMap<String, PostSummary>,
    /// postID -> aggregate score.
    score_index: HashMap<String, f64>,
    /// postID -> creation unix seconds.
    time_index: HashMap<String, f64>,
    /// postID -> (userID -> vote value).
    voters: HashMap<String, HashMap<String, i64>>,
    /// communityID -> member postIDs.
    communities: HashMap<String, HashSet<String>>,
    /// (postID, userID) -> marker deadline.
    markers: HashMap<(String, String), Instant>,
    /// (order, communityID) -> cached scoped index.
    scoped: HashMap<(&'static str, String), ScopedIndex>,
}

struct ScopedIndex {
    entries: HashMap<String, f64>,
    expires_at: Instant,
}

/// In-memory implementation of [`VoteStore`] and [`PostReader`].
pub struct MemoryStore {
    inner: RwLock<Inner>,
    vote_weight: f64,
    page_size: u64,
    hydration: HydrationPolicy,
    marker_ttl: Duration,
    scoped_ttl: Duration,
    vote_window: Option<Duration>,
    fail_on_write: RwLock<bool>,
}

impl MemoryStore {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            vote_weight: config.ranking.vote_weight,
            page_size: config.paging.page_size,
            hydration: config.paging.hydration,
            marker_ttl: Duration::from_secs(config.votes.marker_ttl_secs),
            scoped_ttl: Duration::from_secs(config.storage.scoped_index_ttl_secs),
            vote_window: config.votes.vote_window_secs.map(Duration::from_secs),
            fail_on_write: RwLock::new(false),
        }
    }

    /// Make the next write operations fail without mutating anything.
    /// Used by tests to verify atomic units leave no partial state.
    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// Whether a dedup marker currently exists for (post, user).
    pub async fn has_marker(&self, post: &str, user: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .markers
            .get(&(post.to_string(), user.to_string()))
            .is_some_and(|deadline| *deadline > Instant::now())
    }

    /// Ids of one page of `index`, descending by value then by id, matching
    /// Redis ZREVRANGE ordering.
    fn page_ids(index: &HashMap<String, f64>, page: u64, page_size: u64) -> Vec<String> {
        let mut entries: Vec<(&String, &f64)> = index.iter().collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        });

        let start = ((page - 1) * page_size) as usize;
        entries
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn hydrate(&self, inner: &Inner, ids: Vec<String>) -> Result<Vec<PostSummary>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            match inner.info.get(&id) {
                Some(info) => out.push(info.clone()),
                None => match self.hydration {
                    HydrationPolicy::Partial => {
                        warn!(post = %id, "info record missing, returning partial summary");
                        out.push(PostSummary::unhydrated(&id));
                    }
                    HydrationPolicy::Strict => {
                        return Err(StoreError::PostNotFound { post: id });
                    }
                },
            }
        }
        Ok(out)
    }

    fn global_index<'a>(inner: &'a Inner, order: OrderKind) -> &'a HashMap<String, f64> {
        match order {
            OrderKind::Score => &inner.score_index,
            OrderKind::Time => &inner.time_index,
        }
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn cast_vote(
        &self,
        post: &str,
        user: &str,
        direction: Direction,
    ) -> Result<VoteOutcome> {
        if *self.fail_on_write.read().await {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }

        // Single write lock: check, decide, and apply with no interleaving.
        let mut inner = self.inner.write().await;

        let info = inner
            .info
            .get(post)
            .ok_or_else(|| StoreError::PostNotFound {
                post: post.to_string(),
            })?;

        if let Some(window) = self.vote_window {
            let age = Utc::now().timestamp() - info.created_at;
            if age > window.as_secs() as i64 {
                return Err(StoreError::VoteWindowClosed {
                    post: post.to_string(),
                });
            }
        }

        let previous = inner
            .voters
            .get(post)
            .and_then(|v| v.get(user))
            .copied()
            .unwrap_or(0);

        let delta = vote::transition(post, user, previous, direction)?;
        let score_delta = delta.score_units as f64 * self.vote_weight;

        inner
            .voters
            .entry(post.to_string())
            .or_default()
            .insert(user.to_string(), direction.value());
        *inner.score_index.entry(post.to_string()).or_insert(0.0) += score_delta;
        if let Some(info) = inner.info.get_mut(post) {
            info.score += score_delta;
            info.votes += delta.votes_delta;
        }
        inner.markers.insert(
            (post.to_string(), user.to_string()),
            Instant::now() + self.marker_ttl,
        );

        debug!(post = %post, user = %user, outcome = ?delta.outcome, "vote applied");
        Ok(delta.outcome)
    }

    async fn create_post(&self, post: &NewPost) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StoreError::Unavailable("injected write failure".into()));
        }

        let mut inner = self.inner.write().await;
        let created = post.created_at.timestamp();

        inner.info.insert(
            post.id.clone(),
            PostSummary {
                id: post.id.clone(),
                title: post.title.clone(),
                summary: post.summary.clone(),
                author_id: post.author_id.clone(),
                community_id: post.community_id.clone(),
                created_at: created,
                votes: 0,
                score: 0.0,
            },
        );
        inner.score_index.insert(post.id.clone(), 0.0);
        inner.time_index.insert(post.id.clone(), created as f64);
        // Author seeded at 0: recorded as a voter, free to cast later.
        inner
            .voters
            .entry(post.id.clone())
            .or_default()
            .insert(post.author_id.clone(), 0);
        inner
            .communities
            .entry(post.community_id.clone())
            .or_default()
            .insert(post.id.clone());

        debug!(post = %post.id, community = %post.community_id, "post projection created");
        Ok(())
    }
}

#[async_trait]
impl PostReader for MemoryStore {
    async fn list_posts(&self, order: OrderKind, page: u64) -> Result<Vec<PostSummary>> {
        let inner = self.inner.read().await;
        let ids = Self::page_ids(Self::global_index(&inner, order), page, self.page_size);
        self.hydrate(&inner, ids)
    }

    async fn list_community_posts(
        &self,
        community: &str,
        order: OrderKind,
        page: u64,
    ) -> Result<Vec<PostSummary>> {
        let mut inner = self.inner.write().await;
        let cache_key = (order.as_str(), community.to_string());

        let expired = inner
            .scoped
            .get(&cache_key)
            .map(|s| s.expires_at <= Instant::now())
            .unwrap_or(true);

        if expired {
            // Wholesale rebuild: membership set intersected with the global
            // index, MAX aggregation (set members carry weight 1, matching
            // Redis ZINTERSTORE over a plain set).
            let members = inner.communities.get(community).cloned().unwrap_or_default();
            let global = Self::global_index(&inner, order);
            let entries: HashMap<String, f64> = members
                .into_iter()
                .filter_map(|id| global.get(&id).map(|v| (id, f64::max(1.0, *v))))
                .collect();

            debug!(community = %community, order = %order.as_str(), size = entries.len(),
                "rebuilt scoped index");
            inner.scoped.insert(
                cache_key.clone(),
                ScopedIndex {
                    entries,
                    expires_at: Instant::now() + self.scoped_ttl,
                },
            );
        }

        let ids = Self::page_ids(
            &inner.scoped[&cache_key].entries,
            page,
            self.page_size,
        );
        self.hydrate(&inner, ids)
    }
}

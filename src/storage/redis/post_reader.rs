//! Redis PostReader implementation.
//!
//! Page reads are ZREVRANGE slices over a chosen zset, hydrated with one
//! HGETALL per id. Community-scoped reads go through a cached ZINTERSTORE
//! of the membership set with the chosen global index (AGGREGATE MAX),
//! rebuilt wholesale on expiry rather than patched incrementally.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::config::Config;
use crate::interfaces::{
    HydrationPolicy, OrderKind, PostReader, PostSummary, Result, StoreError,
};
use crate::storage::redis::keys::Keys;

/// Redis post reader: paginated global and community-scoped listings.
pub struct RedisPostReader {
    conn: ConnectionManager,
    keys: Keys,
    page_size: u64,
    hydration: HydrationPolicy,
    scoped_ttl_secs: u64,
}

impl RedisPostReader {
    /// Connect and build the reader from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let conn = super::vote_store::connect(config).await?;
        Ok(Self::with_connection(conn, config))
    }

    /// Build the reader over an existing connection (shared with the store).
    pub fn with_connection(conn: ConnectionManager, config: &Config) -> Self {
        Self {
            conn,
            keys: Keys::new(&config.storage.key_prefix),
            page_size: config.paging.page_size,
            hydration: config.paging.hydration,
            scoped_ttl_secs: config.storage.scoped_index_ttl_secs,
        }
    }

    /// Read one page of ids from `index_key`, descending, and hydrate them.
    async fn read_page(&self, index_key: &str, page: u64) -> Result<Vec<PostSummary>> {
        let mut conn = self.conn.clone();

        let start = ((page - 1) * self.page_size) as isize;
        let end = start + self.page_size as isize - 1;
        let ids: Vec<String> = conn.zrevrange(index_key, start, end).await?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            let info_key = self.keys.info(&id);
            let fields: HashMap<String, String> = conn.hgetall(&info_key).await?;

            if fields.is_empty() {
                match self.hydration {
                    HydrationPolicy::Partial => {
                        warn!(post = %id, "info record missing, returning partial summary");
                        posts.push(PostSummary::unhydrated(&id));
                        continue;
                    }
                    HydrationPolicy::Strict => {
                        return Err(StoreError::PostNotFound { post: id });
                    }
                }
            }
            posts.push(parse_summary(&info_key, id, fields)?);
        }
        Ok(posts)
    }
}

/// Decode an info-hash field map into a summary. Numeric fields that fail
/// to parse surface as `Corrupt` rather than being silently dropped.
fn parse_summary(
    key: &str,
    id: String,
    mut fields: HashMap<String, String>,
) -> Result<PostSummary> {
    let mut take = |name: &str| fields.remove(name).unwrap_or_default();

    let created_at = parse_number::<f64>(key, "time", &take("time"))? as i64;
    let votes = parse_number::<i64>(key, "votes", &take("votes"))?;
    let score = parse_number::<f64>(key, "score", &take("score"))?;

    Ok(PostSummary {
        title: take("title"),
        summary: take("summary"),
        author_id: take("user:id"),
        community_id: take("community:id"),
        created_at,
        votes,
        score,
        id,
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, field: &str, raw: &str) -> Result<T> {
    if raw.is_empty() {
        return "0".parse::<T>().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("missing numeric field {field}"),
        });
    }
    raw.parse::<T>().map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
        reason: format!("unparseable {field}: {raw:?}"),
    })
}

#[async_trait]
impl PostReader for RedisPostReader {
    async fn list_posts(&self, order: OrderKind, page: u64) -> Result<Vec<PostSummary>> {
        self.read_page(&self.keys.global_index(order), page).await
    }

    async fn list_community_posts(
        &self,
        community: &str,
        order: OrderKind,
        page: u64,
    ) -> Result<Vec<PostSummary>> {
        let mut conn = self.conn.clone();
        let scoped_key = self.keys.scoped(order, community);

        let exists: bool = conn.exists(&scoped_key).await?;
        if !exists {
            // Wholesale rebuild as one MULTI unit. The existence probe can
            // race with another reader; both then build identical content,
            // so no half-built index is ever observable.
            let community_key = self.keys.community(community);
            let global_key = self.keys.global_index(order);

            let _: () = redis::pipe()
                .atomic()
                .cmd("ZINTERSTORE")
                .arg(&scoped_key)
                .arg(2)
                .arg(&community_key)
                .arg(&global_key)
                .arg("AGGREGATE")
                .arg("MAX")
                .ignore()
                .expire(&scoped_key, self.scoped_ttl_secs as i64)
                .ignore()
                .query_async(&mut conn)
                .await?;

            debug!(community = %community, order = %order.as_str(), "rebuilt scoped index");
        }

        self.read_page(&scoped_key, page).await
    }
}

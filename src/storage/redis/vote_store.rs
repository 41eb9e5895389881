//! Redis VoteStore implementation.
//!
//! The cast path is a Lua unit: the previous-value read, the transition
//! decision, and every resulting write execute inside one EVALSHA, which is
//! the only Redis primitive that makes a conditional read-decide-write
//! atomic over a multiplexed connection (WATCH/MULTI is unsafe on a shared
//! `ConnectionManager`). The creation path has no conditional reads, so a
//! plain MULTI pipeline suffices.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{Client, Script};
use tracing::{debug, info};

use crate::config::Config;
use crate::interfaces::{Direction, NewPost, Result, StoreError, VoteOutcome, VoteStore};
use crate::storage::redis::keys::Keys;

/// The atomic cast unit. Mirrors `vote::transition` operation for
/// operation; the two must stay in lockstep.
///
/// KEYS: [1] info hash, [2] score zset, [3] voted zset, [4] marker
/// ARGV: [1] post id, [2] user id, [3] direction value, [4] vote weight,
///       [5] marker ttl secs, [6] now unix secs, [7] vote window secs (0 = off)
const CAST_VOTE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 'missing'
end
local window = tonumber(ARGV[7])
if window > 0 then
  local created = tonumber(redis.call('HGET', KEYS[1], 'time'))
  if created and tonumber(ARGV[6]) - created > window then
    return 'closed'
  end
end
local v = tonumber(ARGV[3])
local prev = tonumber(redis.call('ZSCORE', KEYS[3], ARGV[2])) or 0
if prev == v then
  return 'already'
end
local units = v - prev
redis.call('ZADD', KEYS[3], v, ARGV[2])
redis.call('ZINCRBY', KEYS[2], units * tonumber(ARGV[4]), ARGV[1])
redis.call('HINCRBYFLOAT', KEYS[1], 'score', units * tonumber(ARGV[4]))
local dv = 0
if v == 1 then dv = dv + 1 end
if prev == 1 then dv = dv - 1 end
if dv ~= 0 then
  redis.call('HINCRBY', KEYS[1], 'votes', dv)
end
redis.call('SET', KEYS[4], '1', 'EX', tonumber(ARGV[5]))
if prev == 0 then
  return 'first'
end
return 'reversed'
"#;

/// Redis vote store: the atomic write path (casts and post creation).
pub struct RedisVoteStore {
    conn: ConnectionManager,
    keys: Keys,
    cast_script: Script,
    vote_weight: f64,
    marker_ttl_secs: u64,
    vote_window_secs: u64,
}

impl RedisVoteStore {
    /// Connect and build the store from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let conn = connect(config).await?;
        Ok(Self::with_connection(conn, config))
    }

    /// Build the store over an existing connection (shared with the reader).
    pub fn with_connection(conn: ConnectionManager, config: &Config) -> Self {
        Self {
            conn,
            keys: Keys::new(&config.storage.key_prefix),
            cast_script: Script::new(CAST_VOTE_SCRIPT),
            vote_weight: config.ranking.vote_weight,
            marker_ttl_secs: config.votes.marker_ttl_secs,
            vote_window_secs: config.votes.vote_window_secs.unwrap_or(0),
        }
    }
}

/// Open a managed connection with bounded request timeouts.
pub(crate) async fn connect(config: &Config) -> Result<ConnectionManager> {
    let timeout = Duration::from_millis(config.storage.request_timeout_ms);
    let manager_config = ConnectionManagerConfig::new()
        .set_connection_timeout(timeout)
        .set_response_timeout(timeout);

    let client = Client::open(config.storage.url.as_str())?;
    let conn = client
        .get_connection_manager_with_config(manager_config)
        .await?;

    info!(url = %config.storage.url, "Connected to Redis");
    Ok(conn)
}

#[async_trait]
impl VoteStore for RedisVoteStore {
    async fn cast_vote(
        &self,
        post: &str,
        user: &str,
        direction: Direction,
    ) -> Result<VoteOutcome> {
        let mut conn = self.conn.clone();

        let verdict: String = self
            .cast_script
            .key(self.keys.info(post))
            .key(self.keys.score_index())
            .key(self.keys.voted(post))
            .key(self.keys.marker(post, user))
            .arg(post)
            .arg(user)
            .arg(direction.value())
            .arg(self.vote_weight)
            .arg(self.marker_ttl_secs)
            .arg(Utc::now().timestamp())
            .arg(self.vote_window_secs)
            .invoke_async(&mut conn)
            .await?;

        match verdict.as_str() {
            "first" => {
                debug!(post = %post, user = %user, "first vote applied");
                Ok(VoteOutcome::First)
            }
            "reversed" => {
                debug!(post = %post, user = %user, "vote reversed");
                Ok(VoteOutcome::Reversed)
            }
            "already" => Err(StoreError::AlreadyVoted {
                post: post.to_string(),
                user: user.to_string(),
            }),
            "missing" => Err(StoreError::PostNotFound {
                post: post.to_string(),
            }),
            "closed" => Err(StoreError::VoteWindowClosed {
                post: post.to_string(),
            }),
            other => Err(StoreError::Corrupt {
                key: self.keys.voted(post),
                reason: format!("unexpected cast verdict: {other}"),
            }),
        }
    }

    async fn create_post(&self, post: &NewPost) -> Result<()> {
        let mut conn = self.conn.clone();
        let created = post.created_at.timestamp();
        let voted_key = self.keys.voted(&post.id);

        let info_fields: [(&str, String); 8] = [
            ("title", post.title.clone()),
            ("summary", post.summary.clone()),
            ("post:id", post.id.clone()),
            ("user:id", post.author_id.clone()),
            ("community:id", post.community_id.clone()),
            ("time", created.to_string()),
            ("votes", "0".to_string()),
            ("score", "0".to_string()),
        ];

        // One MULTI unit: either the post is fully visible or not at all.
        let _: () = redis::pipe()
            .atomic()
            // Author seeded at 0: recorded as a voter, free to cast later.
            .zadd(&voted_key, &post.author_id, 0)
            .ignore()
            .expire(&voted_key, self.marker_ttl_secs as i64)
            .ignore()
            .hset_multiple(self.keys.info(&post.id), &info_fields)
            .ignore()
            .zadd(self.keys.score_index(), &post.id, 0)
            .ignore()
            .zadd(self.keys.time_index(), &post.id, created)
            .ignore()
            .sadd(self.keys.community(&post.community_id), &post.id)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(post = %post.id, community = %post.community_id, "post projection created");
        Ok(())
    }
}

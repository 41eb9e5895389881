//! Key layout for the Redis backend.
//!
//! All keys are prefix-joined with colons. Key families:
//!
//! - `{p}:post:info:{postID}`             field map for one post
//! - `{p}:post:score`                     global zset postID -> score
//! - `{p}:post:time`                      global zset postID -> created-at
//! - `{p}:post:voted:{postID}`            zset userID -> vote value
//! - `{p}:community:{communityID}`        set of postID
//! - `{p}:post:voted-mark:{postID}:{userID}`  dedup marker, TTL-bound
//! - `{p}:scoped:{order}:{communityID}`   cached scoped zset, TTL-bound

use crate::interfaces::OrderKind;

/// Key builder shared by the Redis vote store and post reader.
#[derive(Debug, Clone)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn info(&self, post: &str) -> String {
        format!("{}:post:info:{}", self.prefix, post)
    }

    pub fn score_index(&self) -> String {
        format!("{}:post:score", self.prefix)
    }

    pub fn time_index(&self) -> String {
        format!("{}:post:time", self.prefix)
    }

    pub fn global_index(&self, order: OrderKind) -> String {
        match order {
            OrderKind::Score => self.score_index(),
            OrderKind::Time => self.time_index(),
        }
    }

    pub fn voted(&self, post: &str) -> String {
        format!("{}:post:voted:{}", self.prefix, post)
    }

    pub fn community(&self, community: &str) -> String {
        format!("{}:community:{}", self.prefix, community)
    }

    pub fn marker(&self, post: &str, user: &str) -> String {
        format!("{}:post:voted-mark:{}:{}", self.prefix, post, user)
    }

    pub fn scoped(&self, order: OrderKind, community: &str) -> String {
        format!("{}:scoped:{}:{}", self.prefix, order.as_str(), community)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = Keys::new("palaver");
        assert_eq!(keys.info("p1"), "palaver:post:info:p1");
        assert_eq!(keys.score_index(), "palaver:post:score");
        assert_eq!(keys.time_index(), "palaver:post:time");
        assert_eq!(keys.voted("p1"), "palaver:post:voted:p1");
        assert_eq!(keys.community("c1"), "palaver:community:c1");
        assert_eq!(keys.marker("p1", "u1"), "palaver:post:voted-mark:p1:u1");
        assert_eq!(
            keys.scoped(OrderKind::Score, "c1"),
            "palaver:scoped:score:c1"
        );
        assert_eq!(keys.global_index(OrderKind::Time), keys.time_index());
    }
}

//! Ranking functions.
//!
//! The live score index stores an incremental tally (vote weight times net
//! active votes). The decayed "hot" score is computed at read time from the
//! same inputs; which one `Board::rank` exposes is a configuration choice,
//! so neither replaces the other structurally.

use chrono::{DateTime, Utc};

use crate::config::{RankingConfig, RankingStrategyKind};

/// Time-decayed popularity score (the Reddit "hot" formula).
///
/// Deterministic in its inputs. More net up-votes monotonically increases
/// the value at equal timestamps; at equal net votes, more recent posts
/// score higher.
pub fn hot(upvotes: i64, downvotes: i64, created_at: DateTime<Utc>, cfg: &RankingConfig) -> f64 {
    let s = (upvotes - downvotes) as f64;
    let order = f64::log10(f64::max(s.abs(), 1.0));
    let sign = if s > 0.0 {
        1.0
    } else if s == 0.0 {
        0.0
    } else {
        -1.0
    };
    let seconds = (created_at.timestamp() - cfg.epoch_offset) as f64;
    (sign * order + seconds / cfg.decay_divisor).round()
}

/// Raw tally: net active votes times the vote weight. This is exactly what
/// the live score index holds.
pub fn tally(upvotes: i64, downvotes: i64, cfg: &RankingConfig) -> f64 {
    (upvotes - downvotes) as f64 * cfg.vote_weight
}

/// Pluggable ranking strategy.
pub trait RankingStrategy: Send + Sync {
    fn score(&self, upvotes: i64, downvotes: i64, created_at: DateTime<Utc>) -> f64;
}

/// Strategy wrapper over [`hot`].
pub struct HotRanking {
    cfg: RankingConfig,
}

/// Strategy wrapper over [`tally`].
pub struct TallyRanking {
    cfg: RankingConfig,
}

impl RankingStrategy for HotRanking {
    fn score(&self, upvotes: i64, downvotes: i64, created_at: DateTime<Utc>) -> f64 {
        hot(upvotes, downvotes, created_at, &self.cfg)
    }
}

impl RankingStrategy for TallyRanking {
    fn score(&self, upvotes: i64, downvotes: i64, _created_at: DateTime<Utc>) -> f64 {
        tally(upvotes, downvotes, &self.cfg)
    }
}

/// Build the configured strategy.
pub fn strategy_from_config(cfg: &RankingConfig) -> Box<dyn RankingStrategy> {
    match cfg.strategy {
        RankingStrategyKind::Hot => Box::new(HotRanking { cfg: cfg.clone() }),
        RankingStrategyKind::Tally => Box::new(TallyRanking { cfg: cfg.clone() }),
    }
}

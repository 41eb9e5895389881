//! Palaver - vote and ranking core for community forums.
//!
//! A transactional, key-value-backed engine that records per-user votes on
//! posts, maintains running aggregate scores, computes a time-decayed "hot"
//! ranking, and serves paginated, community-scoped, sorted views of posts.
//!
//! The transport layer, identity layer, and relational source of truth are
//! external collaborators; this crate owns only the denormalized listing
//! projection and the vote/ranking mechanics on top of it.

pub mod board;
pub mod config;
pub mod interfaces;
pub mod ranking;
pub mod storage;
pub mod utils;
pub mod vote;

pub use board::Board;
pub use config::Config;
pub use interfaces::{
    Direction, HydrationPolicy, OrderKind, PostReader, PostSummary, StoreError, VoteOutcome,
    VoteStore,
};

//! Abstract interfaces for the engine's seams.
//!
//! These traits define the contracts for:
//! - Vote state + aggregation (atomic write path)
//! - Paginated, ordered post reads (global and community-scoped)
//!
//! Storage backends implement both; callers hold them as trait objects so
//! the Redis and in-memory backends are interchangeable.

pub mod post_reader;
pub mod vote_store;

pub use post_reader::{HydrationPolicy, OrderKind, PostReader, PostSummary};
pub use vote_store::{Direction, NewPost, Result, StoreError, VoteOutcome, VoteStore};

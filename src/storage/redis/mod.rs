//! Redis storage implementations.

mod keys;
mod post_reader;
mod vote_store;

pub use keys::Keys;
pub use post_reader::RedisPostReader;
pub use vote_store::RedisVoteStore;

pub(crate) use vote_store::connect;

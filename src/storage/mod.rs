//! Storage backends.

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, StorageType};
use crate::interfaces::{PostReader, Result, VoteStore};

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryStore;

#[cfg(feature = "redis")]
pub use redis::{RedisPostReader, RedisVoteStore};

/// Initialize storage based on configuration.
///
/// Returns the write path and the read path as trait objects. For Redis
/// they share one managed connection; for memory they are one store.
pub async fn init_storage(
    config: &Config,
) -> Result<(Arc<dyn VoteStore>, Arc<dyn PostReader>)> {
    info!(storage = ?config.storage.storage_type, "initializing storage");

    match config.storage.storage_type {
        StorageType::Memory => {
            let store = Arc::new(MemoryStore::new(config));
            let vote_store: Arc<dyn VoteStore> = store.clone();
            let reader: Arc<dyn PostReader> = store;
            Ok((vote_store, reader))
        }
        #[cfg(feature = "redis")]
        StorageType::Redis => {
            let conn = redis::connect(config).await?;
            let store: Arc<dyn VoteStore> =
                Arc::new(redis::RedisVoteStore::with_connection(conn.clone(), config));
            let reader: Arc<dyn PostReader> =
                Arc::new(redis::RedisPostReader::with_connection(conn, config));
            Ok((store, reader))
        }
        #[cfg(not(feature = "redis"))]
        StorageType::Redis => Err(crate::interfaces::StoreError::Unavailable(
            "redis backend requested but the 'redis' feature is not enabled".to_string(),
        )),
    }
}

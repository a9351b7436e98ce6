//! Cache Module
//!
//! The typed caching facade. Every write validates its key and value, encodes
//! the value, issues the store command, and then re-applies the key's TTL.
//! Reads decode tolerantly. Store commands the facade does not wrap are
//! reachable through [`Cache::call`].

mod gateway;
mod hash;
mod keys;
mod list;
mod scalar;
mod set;
mod sorted_set;


pub use keys::KeyScan;

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::Config;
use crate::contract::DEFAULT_TTL;
use crate::error::Result;
use crate::store::{MemoryStore, RedisStore, Store};
use crate::tasks::spawn_cleanup_task;

// == Cache ==
/// Typed facade over a [`Store`].
///
/// Holds a single shared store handle, so clones are cheap and the facade
/// can be shared across tasks as long as the store can.
#[derive(Clone)]
pub struct Cache {
    /// Injected store handle
    store: Arc<dyn Store>,
    /// TTL in seconds for writes that pass `None`
    default_ttl: u64,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.store.name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl Cache {
    // == Constructor ==
    /// Creates a facade over `store` with the one-day default TTL.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Overrides the TTL used by writes that pass `None`.
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = seconds;
        self
    }

    /// Connects a facade to the Redis server described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = RedisStore::connect(config).await?;
        Ok(Self::new(Arc::new(store)).with_default_ttl(config.default_ttl))
    }

    /// Creates a facade over a fresh [`MemoryStore`] and starts its sweeper.
    ///
    /// Uses `config.default_ttl` and sweeps every `config.cleanup_interval`
    /// seconds. Must be called from within a tokio runtime. Abort the
    /// returned handle to stop the sweeper.
    ///
    /// # Arguments
    /// * `config` - Only the TTL and cleanup settings are read
    pub fn in_memory(config: &Config) -> (Self, JoinHandle<()>) {
        let store = MemoryStore::new();
        let sweeper = spawn_cleanup_task(store.clone(), config.cleanup_interval);
        let cache = Self::new(Arc::new(store)).with_default_ttl(config.default_ttl);
        (cache, sweeper)
    }

    // == Store Access ==
    /// Replaces the store handle, e.g. with a [`MemoryStore`](crate::store::MemoryStore) in tests.
    pub fn inject_store(&mut self, store: Arc<dyn Store>) {
        self.store = store;
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Second step of every expiring write. Runs for new and existing keys
    /// alike, so each write extends the key's life.
    async fn refresh_ttl(&self, key: &str, ttl: Option<u64>) -> Result<()> {
        self.store
            .expire(key, ttl.unwrap_or(self.default_ttl))
            .await?;
        Ok(())
    }
}

fn skip(operation: &str, argument: &str) {
    debug!("Skipping {}: invalid {}", operation, argument);
}

#[cfg(test)]
pub(crate) fn test_cache() -> (Cache, crate::store::MemoryStore) {
    let store = crate::store::MemoryStore::new();
    (Cache::new(Arc::new(store.clone())), store)
}

//! SmartCache - a typed caching facade over a key-value store
//!
//! Values are JSON-encoded on write and decoded tolerantly on read; every
//! expiring write re-applies the key's TTL.

pub mod cache;
pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod store;
pub mod tasks;

pub use cache::{Cache, KeyScan};
pub use codec::Decoded;
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{KeyTtl, KeyType, MemoryStore, ObjectInfo, RedisStore, Reply, Store};
pub use tasks::spawn_cleanup_task;

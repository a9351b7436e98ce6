//! Store Module
//!
//! The command surface the cache facade needs from a key-value store, plus
//! the Redis-backed and in-memory implementations of it.

mod memory;
mod redis_store;

pub use self::memory::{MemoryStore, DATABASES, SCAN_BATCH};
pub use self::redis_store::RedisStore;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

// == Key Type ==
/// Container type reported by the store for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// Key does not exist
    None,
    String,
    List,
    Set,
    ZSet,
    Hash,
    /// Any type the facade has no typed operations for (e.g. streams)
    Other(String),
}

impl KeyType {
    /// Name of the type as the store's `TYPE` command reports it.
    pub fn as_str(&self) -> &str {
        match self {
            KeyType::None => "none",
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::Hash => "hash",
            KeyType::Other(name) => name,
        }
    }
}

impl From<&str> for KeyType {
    fn from(name: &str) -> Self {
        match name {
            "none" => KeyType::None,
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "hash" => KeyType::Hash,
            other => KeyType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Key TTL ==
/// Remaining lifetime of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist
    Missing,
    /// Key exists without an expiration
    Persistent,
    /// Key expires in the given number of seconds
    Expires(u64),
}

impl KeyTtl {
    /// Maps the integer reply of the `TTL` command.
    pub fn from_reply(seconds: i64) -> Self {
        match seconds {
            -2 => KeyTtl::Missing,
            s if s < 0 => KeyTtl::Persistent,
            s => KeyTtl::Expires(s as u64),
        }
    }

    /// Integer form used by the `TTL` command.
    pub fn as_reply(&self) -> i64 {
        match self {
            KeyTtl::Missing => -2,
            KeyTtl::Persistent => -1,
            KeyTtl::Expires(seconds) => *seconds as i64,
        }
    }

    pub fn seconds(&self) -> Option<u64> {
        match self {
            KeyTtl::Expires(seconds) => Some(*seconds),
            _ => None,
        }
    }
}

impl fmt::Display for KeyTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyTtl::Missing => f.write_str("missing"),
            KeyTtl::Persistent => f.write_str("persistent"),
            KeyTtl::Expires(seconds) => write!(f, "{}s", seconds),
        }
    }
}

// == Object Info ==
/// Subcommands of the store's `OBJECT` introspection command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectInfo {
    IdleTime,
    RefCount,
    Encoding,
    Freq,
}

impl ObjectInfo {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectInfo::IdleTime => "IDLETIME",
            ObjectInfo::RefCount => "REFCOUNT",
            ObjectInfo::Encoding => "ENCODING",
            ObjectInfo::Freq => "FREQ",
        }
    }
}

// == Reply ==
/// Untyped reply returned by raw store commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Bulk(Vec<u8>),
    Status(String),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(bytes) => Some(bytes),
            Reply::Status(status) => Some(status.as_bytes()),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Status reply for successful commands without a payload.
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }
}

impl From<bool> for Reply {
    fn from(value: bool) -> Self {
        Reply::Int(value as i64)
    }
}

impl From<Option<Vec<u8>>> for Reply {
    fn from(value: Option<Vec<u8>>) -> Self {
        value.map_or(Reply::Nil, Reply::Bulk)
    }
}

// == Store Trait ==
/// Primitive command surface of a key-value store.
///
/// Keys and values are opaque to the store; the facade encodes values before
/// they arrive here. Anything not listed is reachable through [`Store::command`].
#[async_trait]
pub trait Store: Send + Sync {
    /// A short name for logging, e.g. "redis" or "memory".
    fn name(&self) -> &'static str;

    // Keys and strings
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool>;
    /// Expires the key at a Unix timestamp in seconds.
    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool>;
    async fn persist(&self, key: &str) -> Result<bool>;
    /// Moves the key to another logical database.
    async fn move_to_db(&self, key: &str, db: u32) -> Result<bool>;
    async fn key_type(&self, key: &str) -> Result<KeyType>;
    async fn rename(&self, key: &str, new_key: &str) -> Result<()>;
    async fn rename_nx(&self, key: &str, new_key: &str) -> Result<bool>;
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;
    async fn object(&self, info: ObjectInfo, key: &str) -> Result<Reply>;
    /// Appends raw bytes to a string value, returning the new length.
    async fn append(&self, key: &str, value: &[u8]) -> Result<u64>;

    // Hashes
    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool>;
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;
    async fn hlen(&self, key: &str) -> Result<u64>;

    // Lists
    async fn lpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64>;
    async fn rpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64>;
    async fn lpop(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn rpop(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Inclusive range; negative indexes count from the tail.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>>;
    async fn llen(&self, key: &str) -> Result<u64>;

    // Sets
    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool>;
    async fn srem(&self, key: &str, member: &[u8]) -> Result<bool>;
    async fn sismember(&self, key: &str, member: &[u8]) -> Result<bool>;
    async fn smove(&self, src: &str, dst: &str, member: &[u8]) -> Result<bool>;
    /// Up to `count` distinct random members.
    async fn srandmember(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>>;
    async fn scard(&self, key: &str) -> Result<u64>;

    // Sorted sets
    /// Adds `(score, member)` pairs, returning the number of new members.
    async fn zadd(&self, key: &str, members: Vec<(f64, Vec<u8>)>) -> Result<u64>;
    async fn zrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: u64,
        count: u64,
    ) -> Result<Vec<Vec<u8>>>;
    async fn zcard(&self, key: &str) -> Result<u64>;

    // Keyspace
    /// One scan step: the next cursor (0 when done) and a batch of keys.
    async fn scan(&self, cursor: u64) -> Result<(u64, Vec<String>)>;

    /// Runs a raw command by name.
    ///
    /// Names the store cannot resolve fail with
    /// [`CacheError::UnsupportedOperation`](crate::error::CacheError::UnsupportedOperation).
    async fn command(&self, name: &str, args: Vec<Vec<u8>>) -> Result<Reply>;
}

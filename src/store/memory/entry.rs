//! Memory Entry Module
//!
//! Defines a single keyspace slot: typed container data with expiry and
//! access metadata.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::store::KeyType;

// == Data ==
/// Container held at a key.
#[derive(Debug, Clone)]
pub enum Data {
    Str(Vec<u8>),
    Hash(HashMap<String, Vec<u8>>),
    List(VecDeque<Vec<u8>>),
    Set(HashSet<Vec<u8>>),
    /// Member to score
    ZSet(HashMap<Vec<u8>, f64>),
}

impl Data {
    pub fn key_type(&self) -> KeyType {
        match self {
            Data::Str(_) => KeyType::String,
            Data::Hash(_) => KeyType::Hash,
            Data::List(_) => KeyType::List,
            Data::Set(_) => KeyType::Set,
            Data::ZSet(_) => KeyType::ZSet,
        }
    }

    /// Internal encoding name reported by `OBJECT ENCODING`.
    pub fn encoding(&self) -> &'static str {
        match self {
            Data::Str(_) => "raw",
            Data::Hash(_) => "hashtable",
            Data::List(_) => "quicklist",
            Data::Set(_) => "hashtable",
            Data::ZSet(_) => "skiplist",
        }
    }

    /// Containers are dropped from the keyspace once their last element goes.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Data::Str(_) => false,
            Data::Hash(map) => map.is_empty(),
            Data::List(list) => list.is_empty(),
            Data::Set(set) => set.is_empty(),
            Data::ZSet(zset) => zset.is_empty(),
        }
    }
}

// == Entry ==
/// A keyspace slot with its data and metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored container
    pub data: Data,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Last read or write (Unix milliseconds)
    pub accessed_at: u64,
    /// Creation order; scan cursors resume from it
    pub seq: u64,
}

/// Next creation sequence number. Starts at 1 so cursor 0 can mean "start".
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

impl Entry {
    // == Constructor ==
    /// Creates a new entry without expiration.
    pub fn new(data: Data) -> Self {
        Self {
            data,
            expires_at: None,
            accessed_at: current_timestamp_ms(),
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    /// Clears the expiration. Returns false if there was none.
    pub fn persist(&mut self) -> bool {
        self.expires_at.take().is_some()
    }

    /// Marks the entry as accessed now.
    pub fn touch(&mut self) {
        self.accessed_at = current_timestamp_ms();
    }

    /// Seconds since the last access.
    pub fn idle_seconds(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.accessed_at) / 1000
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    /// Returns remaining TTL in seconds, rounded to the nearest second.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| (ms + 500) / 1000)
    }
}

// == Utility Functions ==
/// Unix millisecond deadline `seconds` from now.
///
/// `None` when the deadline does not fit a signed 64-bit millisecond
/// timestamp, the range Redis accepts.
pub fn deadline_ms(seconds: u64) -> Option<u64> {
    seconds
        .checked_mul(1000)?
        .checked_add(current_timestamp_ms())
        .filter(|deadline| *deadline <= i64::MAX as u64)
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

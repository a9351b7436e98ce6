//! Key introspection and maintenance: existence, expiry, renames, type and
//! size queries, raw appends, and the keyspace scan.

use std::fmt::Display;

use chrono::{DateTime, Utc};

use super::{skip, Cache};
use crate::contract::coerce_key;
use crate::error::{CacheError, Result};
use crate::store::{KeyTtl, KeyType, ObjectInfo, Reply, Store};

impl Cache {
    pub async fn exists(&self, name: impl Display) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.exists(&key).await
    }

    /// Deletes the key. Returns whether it existed.
    pub async fn delete(&self, name: impl Display) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.delete(&key).await
    }

    /// Sets the key to expire `seconds` from now.
    pub async fn expire(&self, name: impl Display, seconds: u64) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.expire(&key, seconds).await
    }

    /// Sets the key to expire at `when`.
    pub async fn expire_at(&self, name: impl Display, when: DateTime<Utc>) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.expire_at(&key, when.timestamp()).await
    }

    /// Clears the key's expiration.
    pub async fn persist(&self, name: impl Display) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.persist(&key).await
    }

    /// Moves the key to logical database `db`.
    pub async fn move_to_db(&self, name: impl Display, db: u32) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        self.store.move_to_db(&key, db).await
    }

    /// Object introspection for the key; `Reply::Nil` if it does not exist.
    pub async fn object(&self, name: impl Display, info: ObjectInfo) -> Result<Reply> {
        let Some(key) = coerce_key(name) else {
            return Ok(Reply::Nil);
        };
        self.store.object(info, &key).await
    }

    /// Seconds since the key was last read or written.
    pub async fn idle_time(&self, name: impl Display) -> Result<Option<u64>> {
        let reply = self.object(name, ObjectInfo::IdleTime).await?;
        Ok(reply.as_int().map(|seconds| seconds.max(0) as u64))
    }

    /// Renames the key, replacing any key already at `new_name`.
    ///
    /// Returns `false` if either name is invalid. A missing source key is a
    /// store error.
    pub async fn rename(&self, name: impl Display, new_name: impl Display) -> Result<bool> {
        let (Some(key), Some(new_key)) = (coerce_key(name), coerce_key(new_name)) else {
            skip("rename", "key");
            return Ok(false);
        };
        self.store.rename(&key, &new_key).await?;
        Ok(true)
    }

    /// Renames the key only if nothing exists at `new_name`.
    pub async fn rename_nx(&self, name: impl Display, new_name: impl Display) -> Result<bool> {
        let (Some(key), Some(new_key)) = (coerce_key(name), coerce_key(new_name)) else {
            skip("rename_nx", "key");
            return Ok(false);
        };
        self.store.rename_nx(&key, &new_key).await
    }

    pub async fn ttl(&self, name: impl Display) -> Result<KeyTtl> {
        let Some(key) = coerce_key(name) else {
            return Ok(KeyTtl::Missing);
        };
        self.store.ttl(&key).await
    }

    pub async fn key_type(&self, name: impl Display) -> Result<KeyType> {
        let Some(key) = coerce_key(name) else {
            return Ok(KeyType::None);
        };
        self.store.key_type(&key).await
    }

    // == Size ==
    /// Number of elements in the container at `name`.
    ///
    /// Dispatches on the stored type: member count for sets and sorted sets,
    /// field count for hashes, length for lists (and 0 for missing keys).
    ///
    /// # Errors
    /// [`CacheError::TypeMismatch`] for scalar keys, whose length would be
    /// ambiguous with the byte length of the encoded value.
    pub async fn size(&self, name: impl Display) -> Result<u64> {
        let Some(key) = coerce_key(name) else {
            return Ok(0);
        };
        match self.store.key_type(&key).await? {
            KeyType::Set => self.store.scard(&key).await,
            KeyType::ZSet => self.store.zcard(&key).await,
            KeyType::Hash => self.store.hlen(&key).await,
            KeyType::String => Err(CacheError::TypeMismatch(format!("{} is string type", key))),
            _ => self.store.llen(&key).await,
        }
    }

    /// Appends raw bytes to the string at `name`, bypassing the codec.
    ///
    /// Appending to an encoded value makes later reads come back raw.
    /// Returns the new length, or `None` if the key is invalid.
    pub async fn append(&self, name: impl Display, value: impl AsRef<[u8]>) -> Result<Option<u64>> {
        let Some(key) = coerce_key(name) else {
            skip("append", "key");
            return Ok(None);
        };
        Ok(Some(self.store.append(&key, value.as_ref()).await?))
    }

    // == Scan ==
    /// Starts a lazy walk over every key in the store's database.
    pub fn scan_db(&self) -> KeyScan<'_> {
        self.scan_from(0)
    }

    /// Resumes a walk from a cursor previously reported by [`KeyScan::cursor`].
    pub fn scan_from(&self, cursor: u64) -> KeyScan<'_> {
        KeyScan {
            store: self.store.as_ref(),
            cursor,
            finished: false,
        }
    }
}

// == Key Scan ==
/// Cursor-driven walk over the keyspace, one store round trip per batch.
///
/// The walk ends when the store hands back cursor 0. Batches may be empty
/// before that.
pub struct KeyScan<'a> {
    store: &'a dyn Store,
    cursor: u64,
    finished: bool,
}

impl KeyScan<'_> {
    /// Cursor the next batch will be requested from.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetches the next batch, or `None` once the store reported the end.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        if self.finished {
            return Ok(None);
        }
        let (next, batch) = self.store.scan(self.cursor).await?;
        self.cursor = next;
        self.finished = next == 0;
        Ok(Some(batch))
    }

    /// Drains the walk into one list of keys.
    pub async fn collect_keys(mut self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            keys.extend(batch);
        }
        Ok(keys)
    }
}

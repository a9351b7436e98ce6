//! In-Memory Store
//!
//! A process-local store with Redis semantics for the commands the cache
//! facade uses. Expired keys are dropped lazily on access and in bulk by the
//! background sweeper. Handles created with [`MemoryStore::select`] share one
//! keyspace of [`DATABASES`] logical databases.

mod command;
mod entry;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use tokio::sync::RwLock;

use self::entry::{current_timestamp_ms, deadline_ms, Data, Entry};
use crate::error::{CacheError, Result};
use crate::store::{KeyTtl, KeyType, ObjectInfo, Reply, Store};

// == Public Constants ==
/// Number of logical databases in a keyspace
pub const DATABASES: usize = 16;

/// Keys returned per scan step
pub const SCAN_BATCH: usize = 10;

type Db = HashMap<String, Entry>;

#[derive(Debug)]
struct Keyspace {
    databases: Vec<Db>,
}

impl Keyspace {
    fn new() -> Self {
        Self {
            databases: (0..DATABASES).map(|_| HashMap::new()).collect(),
        }
    }
}

// == Memory Store ==
/// In-process store handle bound to one logical database.
///
/// Cloning is cheap; clones share the same keyspace.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    keyspace: Arc<RwLock<Keyspace>>,
    db: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty keyspace and a handle on database 0.
    pub fn new() -> Self {
        Self {
            keyspace: Arc::new(RwLock::new(Keyspace::new())),
            db: 0,
        }
    }

    /// Returns a handle on another database of the same keyspace.
    pub fn select(&self, db: usize) -> Result<Self> {
        if db >= DATABASES {
            return Err(out_of_range());
        }
        Ok(Self {
            keyspace: Arc::clone(&self.keyspace),
            db,
        })
    }

    /// Index of the database this handle operates on.
    pub fn db(&self) -> usize {
        self.db
    }

    // == Length ==
    /// Returns the number of live keys in this handle's database.
    pub async fn len(&self) -> usize {
        let guard = self.keyspace.read().await;
        guard.databases[self.db]
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // == Purge Expired ==
    /// Removes expired keys from every database.
    ///
    /// Returns the number of keys removed.
    pub async fn purge_expired(&self) -> usize {
        let mut guard = self.keyspace.write().await;
        let mut removed = 0;
        for db in guard.databases.iter_mut() {
            let before = db.len();
            db.retain(|_, entry| !entry.is_expired());
            removed += before - db.len();
        }
        removed
    }

    async fn with_db<T>(&self, f: impl FnOnce(&mut Db) -> Result<T> + Send) -> Result<T> {
        let mut guard = self.keyspace.write().await;
        f(&mut guard.databases[self.db])
    }
}

// == Keyspace Helpers ==
fn out_of_range() -> CacheError {
    CacheError::Store("ERR DB index is out of range".to_string())
}

fn no_such_key() -> CacheError {
    CacheError::Store("ERR no such key".to_string())
}

fn arity(command: &str) -> CacheError {
    CacheError::Store(format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}

/// Live entry at `key` without updating its access time.
fn peek<'a>(db: &'a mut Db, key: &str) -> Option<&'a mut Entry> {
    if db.get(key).is_some_and(Entry::is_expired) {
        db.remove(key);
        return None;
    }
    db.get_mut(key)
}

/// Live entry at `key`, marked as accessed.
fn lookup<'a>(db: &'a mut Db, key: &str) -> Option<&'a mut Entry> {
    let entry = peek(db, key)?;
    entry.touch();
    Some(entry)
}

/// Live entry at `key`, created from `init` when absent.
fn slot<'a>(db: &'a mut Db, key: &str, init: fn() -> Data) -> &'a mut Entry {
    if db.get(key).is_some_and(Entry::is_expired) {
        db.remove(key);
    }
    let entry = db
        .entry(key.to_string())
        .or_insert_with(|| Entry::new(init()));
    entry.touch();
    entry
}

fn drop_if_empty(db: &mut Db, key: &str) {
    if db.get(key).is_some_and(|entry| entry.data.is_empty_container()) {
        db.remove(key);
    }
}

fn hash_mut<'a>(db: &'a mut Db, key: &str) -> Result<Option<&'a mut HashMap<String, Vec<u8>>>> {
    match lookup(db, key) {
        None => Ok(None),
        Some(Entry {
            data: Data::Hash(map),
            ..
        }) => Ok(Some(map)),
        Some(_) => Err(CacheError::wrong_type()),
    }
}

fn list_mut<'a>(db: &'a mut Db, key: &str) -> Result<Option<&'a mut VecDeque<Vec<u8>>>> {
    match lookup(db, key) {
        None => Ok(None),
        Some(Entry {
            data: Data::List(list),
            ..
        }) => Ok(Some(list)),
        Some(_) => Err(CacheError::wrong_type()),
    }
}

fn set_mut<'a>(db: &'a mut Db, key: &str) -> Result<Option<&'a mut HashSet<Vec<u8>>>> {
    match lookup(db, key) {
        None => Ok(None),
        Some(Entry {
            data: Data::Set(set),
            ..
        }) => Ok(Some(set)),
        Some(_) => Err(CacheError::wrong_type()),
    }
}

fn zset_mut<'a>(db: &'a mut Db, key: &str) -> Result<Option<&'a mut HashMap<Vec<u8>, f64>>> {
    match lookup(db, key) {
        None => Ok(None),
        Some(Entry {
            data: Data::ZSet(zset),
            ..
        }) => Ok(Some(zset)),
        Some(_) => Err(CacheError::wrong_type()),
    }
}

fn hash_slot<'a>(db: &'a mut Db, key: &str) -> Result<&'a mut HashMap<String, Vec<u8>>> {
    match &mut slot(db, key, || Data::Hash(HashMap::new())).data {
        Data::Hash(map) => Ok(map),
        _ => Err(CacheError::wrong_type()),
    }
}

fn list_slot<'a>(db: &'a mut Db, key: &str) -> Result<&'a mut VecDeque<Vec<u8>>> {
    match &mut slot(db, key, || Data::List(VecDeque::new())).data {
        Data::List(list) => Ok(list),
        _ => Err(CacheError::wrong_type()),
    }
}

fn set_slot<'a>(db: &'a mut Db, key: &str) -> Result<&'a mut HashSet<Vec<u8>>> {
    match &mut slot(db, key, || Data::Set(HashSet::new())).data {
        Data::Set(set) => Ok(set),
        _ => Err(CacheError::wrong_type()),
    }
}

fn zset_slot<'a>(db: &'a mut Db, key: &str) -> Result<&'a mut HashMap<Vec<u8>, f64>> {
    match &mut slot(db, key, || Data::ZSet(HashMap::new())).data {
        Data::ZSet(zset) => Ok(zset),
        _ => Err(CacheError::wrong_type()),
    }
}

/// Resolves an inclusive, possibly negative, index range against `len`.
fn list_window(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start >= len || start > stop {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

// == Store Implementation ==
#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_db(|db| match lookup(db, key) {
            None => Ok(None),
            Some(Entry {
                data: Data::Str(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(CacheError::wrong_type()),
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        // Overwrites any container and clears the previous expiration
        self.with_db(|db| {
            db.insert(key.to_string(), Entry::new(Data::Str(value)));
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.with_db(|db| {
            let live = peek(db, key).is_some();
            db.remove(key);
            Ok(live)
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.with_db(|db| Ok(peek(db, key).is_some())).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let deadline = if seconds == 0 {
            None
        } else {
            Some(deadline_ms(seconds).ok_or_else(|| {
                CacheError::Store("ERR invalid expire time in 'expire' command".to_string())
            })?)
        };
        self.with_db(|db| {
            let Some(entry) = peek(db, key) else {
                return Ok(false);
            };
            match deadline {
                Some(deadline) => entry.expires_at = Some(deadline),
                None => {
                    db.remove(key);
                }
            }
            Ok(true)
        })
        .await
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool> {
        self.with_db(|db| {
            let Some(entry) = peek(db, key) else {
                return Ok(false);
            };
            let at_ms = timestamp.saturating_mul(1000);
            if at_ms <= current_timestamp_ms() as i64 {
                db.remove(key);
            } else {
                entry.expires_at = Some(at_ms as u64);
            }
            Ok(true)
        })
        .await
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        self.with_db(|db| Ok(peek(db, key).is_some_and(Entry::persist)))
            .await
    }

    async fn move_to_db(&self, key: &str, db: u32) -> Result<bool> {
        let target = db as usize;
        if target >= DATABASES {
            return Err(out_of_range());
        }
        if target == self.db {
            return Err(CacheError::Store(
                "ERR source and destination objects are the same".to_string(),
            ));
        }

        let mut guard = self.keyspace.write().await;
        if peek(&mut guard.databases[target], key).is_some() {
            return Ok(false);
        }
        if peek(&mut guard.databases[self.db], key).is_none() {
            return Ok(false);
        }
        let Some(entry) = guard.databases[self.db].remove(key) else {
            return Ok(false);
        };
        guard.databases[target].insert(key.to_string(), entry);
        Ok(true)
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        self.with_db(|db| {
            Ok(peek(db, key).map_or(KeyType::None, |entry| entry.data.key_type()))
        })
        .await
    }

    async fn rename(&self, key: &str, new_key: &str) -> Result<()> {
        self.with_db(|db| {
            if peek(db, key).is_none() {
                return Err(no_such_key());
            }
            let entry = db.remove(key).ok_or_else(no_such_key)?;
            db.insert(new_key.to_string(), entry);
            Ok(())
        })
        .await
    }

    async fn rename_nx(&self, key: &str, new_key: &str) -> Result<bool> {
        self.with_db(|db| {
            if peek(db, key).is_none() {
                return Err(no_such_key());
            }
            if key == new_key || peek(db, new_key).is_some() {
                return Ok(false);
            }
            let entry = db.remove(key).ok_or_else(no_such_key)?;
            db.insert(new_key.to_string(), entry);
            Ok(true)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.with_db(|db| {
            Ok(match peek(db, key) {
                None => KeyTtl::Missing,
                Some(entry) => entry
                    .ttl_remaining()
                    .map_or(KeyTtl::Persistent, KeyTtl::Expires),
            })
        })
        .await
    }

    async fn object(&self, info: ObjectInfo, key: &str) -> Result<Reply> {
        self.with_db(|db| {
            let Some(entry) = peek(db, key) else {
                return Ok(Reply::Nil);
            };
            match info {
                ObjectInfo::IdleTime => Ok(Reply::Int(entry.idle_seconds() as i64)),
                ObjectInfo::RefCount => Ok(Reply::Int(1)),
                ObjectInfo::Encoding => Ok(Reply::Bulk(entry.data.encoding().as_bytes().to_vec())),
                ObjectInfo::Freq => Err(CacheError::Store(
                    "ERR An LFU maxmemory policy is not selected, access frequency not tracked"
                        .to_string(),
                )),
            }
        })
        .await
    }

    async fn append(&self, key: &str, value: &[u8]) -> Result<u64> {
        self.with_db(|db| match &mut slot(db, key, || Data::Str(Vec::new())).data {
            Data::Str(bytes) => {
                bytes.extend_from_slice(value);
                Ok(bytes.len() as u64)
            }
            _ => Err(CacheError::wrong_type()),
        })
        .await
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
        self.with_db(|db| Ok(hash_slot(db, key)?.insert(field.to_string(), value).is_none()))
            .await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.with_db(|db| Ok(hash_mut(db, key)?.and_then(|map| map.get(field).cloned())))
            .await
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        self.with_db(|db| Ok(hash_mut(db, key)?.map_or(0, |map| map.len() as u64)))
            .await
    }

    async fn lpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64> {
        if values.is_empty() {
            return Err(arity("lpush"));
        }
        self.with_db(|db| {
            let list = list_slot(db, key)?;
            for value in values {
                list.push_front(value);
            }
            Ok(list.len() as u64)
        })
        .await
    }

    async fn rpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64> {
        if values.is_empty() {
            return Err(arity("rpush"));
        }
        self.with_db(|db| {
            let list = list_slot(db, key)?;
            list.extend(values);
            Ok(list.len() as u64)
        })
        .await
    }

    async fn lpop(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_db(|db| {
            let Some(list) = list_mut(db, key)? else {
                return Ok(None);
            };
            let value = list.pop_front();
            drop_if_empty(db, key);
            Ok(value)
        })
        .await
    }

    async fn rpop(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_db(|db| {
            let Some(list) = list_mut(db, key)? else {
                return Ok(None);
            };
            let value = list.pop_back();
            drop_if_empty(db, key);
            Ok(value)
        })
        .await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        self.with_db(|db| {
            let Some(list) = list_mut(db, key)? else {
                return Ok(Vec::new());
            };
            Ok(match list_window(list.len(), start, stop) {
                Some((first, last)) => list
                    .iter()
                    .skip(first)
                    .take(last - first + 1)
                    .cloned()
                    .collect(),
                None => Vec::new(),
            })
        })
        .await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.with_db(|db| Ok(list_mut(db, key)?.map_or(0, |list| list.len() as u64)))
            .await
    }

    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool> {
        self.with_db(|db| Ok(set_slot(db, key)?.insert(member)))
            .await
    }

    async fn srem(&self, key: &str, member: &[u8]) -> Result<bool> {
        self.with_db(|db| {
            let Some(set) = set_mut(db, key)? else {
                return Ok(false);
            };
            let removed = set.remove(member);
            drop_if_empty(db, key);
            Ok(removed)
        })
        .await
    }

    async fn sismember(&self, key: &str, member: &[u8]) -> Result<bool> {
        self.with_db(|db| Ok(set_mut(db, key)?.is_some_and(|set| set.contains(member))))
            .await
    }

    async fn smove(&self, src: &str, dst: &str, member: &[u8]) -> Result<bool> {
        self.with_db(|db| {
            // Destination type is checked before the source is modified
            if peek(db, dst).is_some_and(|entry| !matches!(entry.data, Data::Set(_))) {
                return Err(CacheError::wrong_type());
            }
            let Some(set) = set_mut(db, src)? else {
                return Ok(false);
            };
            // Moving onto the same key leaves the set and its TTL untouched
            if src == dst {
                return Ok(set.contains(member));
            }
            if !set.remove(member) {
                return Ok(false);
            }
            drop_if_empty(db, src);
            set_slot(db, dst)?.insert(member.to_vec());
            Ok(true)
        })
        .await
    }

    async fn srandmember(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        self.with_db(|db| {
            let Some(set) = set_mut(db, key)? else {
                return Ok(Vec::new());
            };
            let mut rng = rand::thread_rng();
            Ok(set.iter().cloned().choose_multiple(&mut rng, count))
        })
        .await
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        self.with_db(|db| Ok(set_mut(db, key)?.map_or(0, |set| set.len() as u64)))
            .await
    }

    async fn zadd(&self, key: &str, members: Vec<(f64, Vec<u8>)>) -> Result<u64> {
        if members.is_empty() {
            return Err(arity("zadd"));
        }
        if members.iter().any(|(score, _)| score.is_nan()) {
            return Err(CacheError::Store(
                "ERR value is not a valid float".to_string(),
            ));
        }
        self.with_db(|db| {
            let zset = zset_slot(db, key)?;
            let mut added = 0;
            for (score, member) in members {
                if zset.insert(member, score).is_none() {
                    added += 1;
                }
            }
            Ok(added)
        })
        .await
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: u64,
        count: u64,
    ) -> Result<Vec<Vec<u8>>> {
        self.with_db(|db| {
            let Some(zset) = zset_mut(db, key)? else {
                return Ok(Vec::new());
            };
            let mut members: Vec<(&Vec<u8>, f64)> = zset
                .iter()
                .filter(|(_, score)| **score >= min && **score <= max)
                .map(|(member, score)| (member, *score))
                .collect();
            members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
            Ok(members
                .into_iter()
                .skip(offset as usize)
                .take(count as usize)
                .map(|(member, _)| member.clone())
                .collect())
        })
        .await
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        self.with_db(|db| Ok(zset_mut(db, key)?.map_or(0, |zset| zset.len() as u64)))
            .await
    }

    async fn scan(&self, cursor: u64) -> Result<(u64, Vec<String>)> {
        // The cursor is a creation sequence number, so deleting keys already
        // returned never shifts the keys still ahead of the walk.
        self.with_db(|db| {
            db.retain(|_, entry| !entry.is_expired());
            let mut ahead: Vec<(u64, &String)> = db
                .iter()
                .filter(|(_, entry)| entry.seq >= cursor)
                .map(|(key, entry)| (entry.seq, key))
                .collect();
            ahead.sort_unstable();

            let batch = &ahead[..ahead.len().min(SCAN_BATCH)];
            let next = match batch.last() {
                Some((seq, _)) if ahead.len() > SCAN_BATCH => seq + 1,
                _ => 0,
            };
            Ok((next, batch.iter().map(|(_, key)| key.to_string()).collect()))
        })
        .await
    }

    async fn command(&self, name: &str, args: Vec<Vec<u8>>) -> Result<Reply> {
        command::dispatch(self, name, args).await
    }
}

//! Redis Store
//!
//! Store implementation backed by a Redis server through the `redis` crate's
//! multiplexed `ConnectionManager`. Reconnects and pooling are the client's
//! concern; errors are passed through untranslated.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{KeyTtl, KeyType, ObjectInfo, Reply, Store};

// == Redis Store ==
/// Store handle on one Redis logical database.
///
/// Cloning is cheap; clones multiplex over the same connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the server described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.redis_url()).await
    }

    /// Connects to a `redis://` URL.
    pub async fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        debug!("Connected to {}", url);
        Ok(Self { conn })
    }

    /// Wraps an existing connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn query<T: redis::FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T> {
        let mut conn = self.conn.clone();
        Ok(cmd.query_async(&mut conn).await?)
    }
}

/// Converts a protocol value into the store-neutral reply type.
fn to_reply(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Nil,
        Value::Int(value) => Reply::Int(value),
        Value::BulkString(bytes) => Reply::Bulk(bytes),
        Value::SimpleString(status) => Reply::Status(status),
        Value::Okay => Reply::ok(),
        Value::Boolean(flag) => Reply::Int(flag as i64),
        Value::Double(number) => Reply::Bulk(number.to_string().into_bytes()),
        Value::Array(items) | Value::Set(items) => {
            Reply::Array(items.into_iter().map(to_reply).collect())
        }
        Value::Map(pairs) => Reply::Array(
            pairs
                .into_iter()
                .flat_map(|(key, value)| [to_reply(key), to_reply(value)])
                .collect(),
        ),
        other => Reply::Bulk(format!("{:?}", other).into_bytes()),
    }
}

fn is_unknown_command(err: &redis::RedisError) -> bool {
    err.to_string().to_ascii_lowercase().contains("unknown command")
}

// == Store Implementation ==
#[async_trait]
impl Store for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("GET").arg(key)).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.query(redis::cmd("SET").arg(key).arg(value)).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.query(redis::cmd("DEL").arg(key)).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.query(redis::cmd("EXISTS").arg(key)).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        self.query(redis::cmd("EXPIRE").arg(key).arg(seconds)).await
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool> {
        self.query(redis::cmd("EXPIREAT").arg(key).arg(timestamp)).await
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        self.query(redis::cmd("PERSIST").arg(key)).await
    }

    async fn move_to_db(&self, key: &str, db: u32) -> Result<bool> {
        self.query(redis::cmd("MOVE").arg(key).arg(db)).await
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        let name: String = self.query(redis::cmd("TYPE").arg(key)).await?;
        Ok(KeyType::from(name.as_str()))
    }

    async fn rename(&self, key: &str, new_key: &str) -> Result<()> {
        self.query(redis::cmd("RENAME").arg(key).arg(new_key)).await
    }

    async fn rename_nx(&self, key: &str, new_key: &str) -> Result<bool> {
        self.query(redis::cmd("RENAMENX").arg(key).arg(new_key)).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let seconds: i64 = self.query(redis::cmd("TTL").arg(key)).await?;
        Ok(KeyTtl::from_reply(seconds))
    }

    async fn object(&self, info: ObjectInfo, key: &str) -> Result<Reply> {
        let value: Value = self
            .query(redis::cmd("OBJECT").arg(info.as_str()).arg(key))
            .await?;
        Ok(to_reply(value))
    }

    async fn append(&self, key: &str, value: &[u8]) -> Result<u64> {
        self.query(redis::cmd("APPEND").arg(key).arg(value)).await
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<bool> {
        self.query(redis::cmd("HSET").arg(key).arg(field).arg(value))
            .await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("HGET").arg(key).arg(field)).await
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        self.query(redis::cmd("HLEN").arg(key)).await
    }

    async fn lpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64> {
        self.query(redis::cmd("LPUSH").arg(key).arg(values)).await
    }

    async fn rpush(&self, key: &str, values: Vec<Vec<u8>>) -> Result<u64> {
        self.query(redis::cmd("RPUSH").arg(key).arg(values)).await
    }

    async fn lpop(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("LPOP").arg(key)).await
    }

    async fn rpop(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.query(redis::cmd("RPOP").arg(key)).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        self.query(redis::cmd("LRANGE").arg(key).arg(start).arg(stop))
            .await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.query(redis::cmd("LLEN").arg(key)).await
    }

    async fn sadd(&self, key: &str, member: Vec<u8>) -> Result<bool> {
        self.query(redis::cmd("SADD").arg(key).arg(member)).await
    }

    async fn srem(&self, key: &str, member: &[u8]) -> Result<bool> {
        self.query(redis::cmd("SREM").arg(key).arg(member)).await
    }

    async fn sismember(&self, key: &str, member: &[u8]) -> Result<bool> {
        self.query(redis::cmd("SISMEMBER").arg(key).arg(member))
            .await
    }

    async fn smove(&self, src: &str, dst: &str, member: &[u8]) -> Result<bool> {
        self.query(redis::cmd("SMOVE").arg(src).arg(dst).arg(member))
            .await
    }

    async fn srandmember(&self, key: &str, count: usize) -> Result<Vec<Vec<u8>>> {
        self.query(redis::cmd("SRANDMEMBER").arg(key).arg(count))
            .await
    }

    async fn scard(&self, key: &str) -> Result<u64> {
        self.query(redis::cmd("SCARD").arg(key)).await
    }

    async fn zadd(&self, key: &str, members: Vec<(f64, Vec<u8>)>) -> Result<u64> {
        let mut cmd = redis::cmd("ZADD");
        cmd.arg(key);
        for (score, member) in members {
            cmd.arg(score).arg(member);
        }
        self.query(&cmd).await
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
        offset: u64,
        count: u64,
    ) -> Result<Vec<Vec<u8>>> {
        self.query(
            redis::cmd("ZRANGEBYSCORE")
                .arg(key)
                .arg(score_bound(min))
                .arg(score_bound(max))
                .arg("LIMIT")
                .arg(offset)
                .arg(count),
        )
        .await
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        self.query(redis::cmd("ZCARD").arg(key)).await
    }

    async fn scan(&self, cursor: u64) -> Result<(u64, Vec<String>)> {
        self.query(redis::cmd("SCAN").arg(cursor)).await
    }

    async fn command(&self, name: &str, args: Vec<Vec<u8>>) -> Result<Reply> {
        let mut cmd = redis::cmd(name);
        for arg in args {
            cmd.arg(arg);
        }
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<Value> = cmd.query_async(&mut conn).await;
        match result {
            Ok(value) => Ok(to_reply(value)),
            Err(err) if is_unknown_command(&err) => {
                Err(CacheError::UnsupportedOperation(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Score bound as Redis spells infinities.
fn score_bound(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bound() {
        assert_eq!(score_bound(f64::NEG_INFINITY), "-inf");
        assert_eq!(score_bound(f64::INFINITY), "+inf");
        assert_eq!(score_bound(2.5), "2.5");
    }

    #[test]
    fn test_to_reply() {
        assert_eq!(to_reply(Value::Nil), Reply::Nil);
        assert_eq!(to_reply(Value::Okay), Reply::ok());
        assert_eq!(to_reply(Value::Int(7)), Reply::Int(7));
        assert_eq!(
            to_reply(Value::Array(vec![
                Value::BulkString(b"a".to_vec()),
                Value::SimpleString("b".to_string()),
            ])),
            Reply::Array(vec![
                Reply::Bulk(b"a".to_vec()),
                Reply::Status("b".to_string())
            ])
        );
    }
}

//! Sorted set operations. Members are encoded values ordered by score.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use super::{skip, Cache};
use crate::codec::{decode, Decoded};
use crate::contract::{coerce_key, payload};
use crate::error::Result;

impl Cache {
    /// Adds `(value, score)` pairs to the sorted set at `name` and refreshes
    /// the key's TTL.
    ///
    /// Use [`Cache::update_score`] for a single pair. The push is best effort:
    /// if the store rejects it, the error is logged, the TTL is refreshed
    /// anyway, and `false` is returned. Nothing is rolled back.
    pub async fn update_scored<T, I>(&self, name: impl Display, scored: I, ttl: Option<u64>) -> Result<bool>
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Serialize,
    {
        let Some(key) = coerce_key(name) else {
            skip("update_scored", "key");
            return Ok(false);
        };

        let mut members = Vec::new();
        for (value, score) in scored {
            if let Some(member) = payload(&value)? {
                members.push((score, member));
            }
        }
        if members.is_empty() {
            skip("update_scored", "values");
            return Ok(false);
        }

        let pushed = match self.store.zadd(&key, members).await {
            Ok(_) => true,
            Err(err) => {
                error!("Sorted set push to {} failed: {}", key, err);
                false
            }
        };
        self.refresh_ttl(&key, ttl).await?;
        Ok(pushed)
    }

    /// Adds one `value` with `score`; see [`Cache::update_scored`].
    pub async fn update_score<T: Serialize + ?Sized>(
        &self,
        name: impl Display,
        value: &T,
        score: f64,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.update_scored(name, [(value, score)], ttl).await
    }

    /// Reads up to `limit` members over the full score range, lowest score
    /// first, after skipping `skip` members.
    pub async fn range_by_score<T: DeserializeOwned>(
        &self,
        name: impl Display,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(Vec::new());
        };
        let members = self
            .store
            .zrangebyscore(&key, f64::NEG_INFINITY, f64::INFINITY, skip, limit)
            .await?;
        Ok(members.into_iter().map(decode::<T>).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::test_cache;
    use crate::codec::Decoded;
    use crate::store::{KeyTtl, Store};

    #[tokio::test]
    async fn test_update_and_range() {
        let (cache, _) = test_cache();

        let pushed = cache
            .update_scored("board", [("alice", 10.0), ("bob", 5.0)], None)
            .await
            .unwrap();
        assert!(pushed);

        let members = cache.range_by_score::<String>("board", 0, 10).await.unwrap();
        assert_eq!(
            members,
            vec![
                Decoded::Value("bob".to_string()),
                Decoded::Value("alice".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_single_pair() {
        let (cache, store) = test_cache();

        assert!(cache.update_score("board", "carol", 1.5, Some(70)).await.unwrap());
        assert!(cache.update_score("board", &vec!["x", "y"], 0.5, None).await.unwrap());
        assert_eq!(store.zcard("board").await.unwrap(), 2);

        let members = cache.range_by_score::<serde_json::Value>("board", 0, 1).await.unwrap();
        assert_eq!(members, vec![Decoded::Value(serde_json::json!(["x", "y"]))]);
    }

    #[tokio::test]
    async fn test_range_paging() {
        let (cache, _) = test_cache();

        let scored = (0..6).map(|n| (format!("p{}", n), n as f64));
        cache.update_scored("ranks", scored, None).await.unwrap();

        let page = cache.range_by_score::<String>("ranks", 2, 2).await.unwrap();
        assert_eq!(
            page,
            vec![
                Decoded::Value("p2".to_string()),
                Decoded::Value("p3".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_push_still_refreshes_ttl() {
        let (cache, store) = test_cache();

        cache.update_scored("board", [("alice", 1.0)], Some(10)).await.unwrap();

        let pushed = cache
            .update_scored("board", [("bob", f64::NAN)], Some(500))
            .await
            .unwrap();
        assert!(!pushed);
        assert_eq!(store.zcard("board").await.unwrap(), 1);
        assert_eq!(store.ttl("board").await.unwrap(), KeyTtl::Expires(500));
    }

    #[tokio::test]
    async fn test_skips_invalid_input() {
        let (cache, store) = test_cache();

        assert!(!cache.update_scored("", [("a", 1.0)], None).await.unwrap());
        assert!(!cache.update_scored("board", [("", 1.0)], None).await.unwrap());
        assert!(store.is_empty().await);
    }
}

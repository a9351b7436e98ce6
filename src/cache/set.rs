//! Set operations. Members are the encoded values.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{skip, Cache};
use crate::codec::{decode, Decoded};
use crate::contract::{coerce_key, payload};
use crate::error::Result;

impl Cache {
    /// Adds `value` to the set at `name`.
    ///
    /// Unlike every other write, this does not touch the key's TTL: the set
    /// keeps whatever expiration it had, and a set created here never
    /// expires until some other call sets one.
    pub async fn add_member<T: Serialize + ?Sized>(&self, name: impl Display, value: &T) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            skip("add_member", "key");
            return Ok(false);
        };
        let Some(member) = payload(value)? else {
            skip("add_member", "value");
            return Ok(false);
        };
        self.store.sadd(&key, member).await
    }

    /// Removes `value` from the set at `name`. Returns whether it was present.
    pub async fn remove_member<T: Serialize + ?Sized>(&self, name: impl Display, value: &T) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            skip("remove_member", "key");
            return Ok(false);
        };
        let Some(member) = payload(value)? else {
            skip("remove_member", "value");
            return Ok(false);
        };
        self.store.srem(&key, &member).await
    }

    /// Moves `value` from the set at `src` to the set at `dst`.
    pub async fn move_member<T: Serialize + ?Sized>(
        &self,
        src: impl Display,
        dst: impl Display,
        value: &T,
    ) -> Result<bool> {
        let (Some(src), Some(dst)) = (coerce_key(src), coerce_key(dst)) else {
            skip("move_member", "key");
            return Ok(false);
        };
        let Some(member) = payload(value)? else {
            skip("move_member", "value");
            return Ok(false);
        };
        self.store.smove(&src, &dst, &member).await
    }

    /// Membership test.
    pub async fn contains<T: Serialize + ?Sized>(&self, name: impl Display, value: &T) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            return Ok(false);
        };
        let Some(member) = payload(value)? else {
            return Ok(false);
        };
        self.store.sismember(&key, &member).await
    }

    /// Up to `count` distinct members picked at random.
    pub async fn random_members<T: DeserializeOwned>(
        &self,
        name: impl Display,
        count: usize,
    ) -> Result<Vec<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(Vec::new());
        };
        if count == 0 {
            return Ok(Vec::new());
        }
        let members = self.store.srandmember(&key, count).await?;
        Ok(members.into_iter().map(decode::<T>).collect())
    }

    /// One member picked at random, `None` for an empty or missing set.
    pub async fn random_member<T: DeserializeOwned>(&self, name: impl Display) -> Result<Option<Decoded<T>>> {
        Ok(self.random_members(name, 1).await?.pop())
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::test_cache;
    use crate::codec::Decoded;
    use crate::store::{KeyTtl, Store};

    #[tokio::test]
    async fn test_add_contains_remove() {
        let (cache, _) = test_cache();

        assert!(cache.add_member("s", "x").await.unwrap());
        assert!(!cache.add_member("s", "x").await.unwrap());
        assert!(cache.contains("s", "x").await.unwrap());
        assert!(!cache.contains("s", "y").await.unwrap());

        assert!(cache.remove_member("s", "x").await.unwrap());
        assert!(!cache.contains("s", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_does_not_refresh_ttl() {
        let (cache, store) = test_cache();

        cache.add_member("visitors", "alice").await.unwrap();
        assert_eq!(store.ttl("visitors").await.unwrap(), KeyTtl::Persistent);

        store.expire("visitors", 50).await.unwrap();
        cache.add_member("visitors", "bob").await.unwrap();
        assert_eq!(store.ttl("visitors").await.unwrap(), KeyTtl::Expires(50));
    }

    #[tokio::test]
    async fn test_move_member() {
        let (cache, _) = test_cache();

        cache.add_member("pending", &7).await.unwrap();
        assert!(cache.move_member("pending", "done", &7).await.unwrap());
        assert!(!cache.contains("pending", &7).await.unwrap());
        assert!(cache.contains("done", &7).await.unwrap());
        assert!(!cache.move_member("pending", "done", &7).await.unwrap());
    }

    #[tokio::test]
    async fn test_random_member() {
        let (cache, _) = test_cache();

        assert_eq!(cache.random_member::<String>("colors").await.unwrap(), None);

        for color in ["red", "green", "blue"] {
            cache.add_member("colors", color).await.unwrap();
        }
        let picked = cache.random_member::<String>("colors").await.unwrap();
        let picked = picked.and_then(Decoded::into_value).unwrap();
        assert!(["red", "green", "blue"].contains(&picked.as_str()));

        let sample = cache.random_members::<String>("colors", 2).await.unwrap();
        assert_eq!(sample.len(), 2);
        assert!(cache.random_members::<String>("colors", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_skips_invalid_input() {
        let (cache, store) = test_cache();

        assert!(!cache.add_member("", "x").await.unwrap());
        assert!(!cache.add_member("s", "").await.unwrap());
        assert!(!cache.remove_member("", "x").await.unwrap());
        assert!(!cache.move_member("s", "", "x").await.unwrap());
        assert!(!cache.contains("s", "").await.unwrap());
        assert!(store.is_empty().await);
    }
}

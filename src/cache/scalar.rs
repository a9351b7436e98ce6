//! Scalar operations: one encoded value per key.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{skip, Cache};
use crate::codec::{decode, Decoded};
use crate::contract::{coerce_key, payload};
use crate::error::Result;

impl Cache {
    // == Set ==
    /// Stores `value` at `name` and refreshes the key's TTL.
    ///
    /// # Arguments
    /// * `name` - The key, coerced to a string
    /// * `value` - Any serializable value
    /// * `ttl` - TTL in seconds (uses the default TTL if None)
    ///
    /// Returns `false` without contacting the store if the key or value is
    /// empty or absent.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        name: impl Display,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let Some(key) = coerce_key(name) else {
            skip("set", "key");
            return Ok(false);
        };
        let Some(payload) = payload(value)? else {
            skip("set", "value");
            return Ok(false);
        };

        self.store.set(&key, payload).await?;
        self.refresh_ttl(&key, ttl).await?;
        Ok(true)
    }

    // == Get ==
    /// Reads the value at `name`.
    ///
    /// Returns `None` for missing keys. Payloads that do not decode as `T`
    /// come back as [`Decoded::Raw`].
    pub async fn get<T: DeserializeOwned>(&self, name: impl Display) -> Result<Option<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(None);
        };
        Ok(self.store.get(&key).await?.map(decode::<T>))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use crate::cache::test_cache;
    use crate::codec::Decoded;
    use crate::store::{KeyTtl, Store};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        roles: Vec<String>,
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (cache, _) = test_cache();

        assert!(cache.set("greeting", "hello", None).await.unwrap());
        let value = cache.get::<String>("greeting").await.unwrap();
        assert_eq!(value, Some(Decoded::Value("hello".to_string())));
    }

    #[tokio::test]
    async fn test_set_struct_value() {
        let (cache, _) = test_cache();
        let session = Session {
            user: "alice".to_string(),
            roles: vec!["admin".to_string()],
        };

        cache.set("session_1", &session, Some(600)).await.unwrap();
        let stored = cache.get::<Session>("session_1").await.unwrap();
        assert_eq!(stored.and_then(Decoded::into_value), Some(session));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (cache, _) = test_cache();
        assert_eq!(cache.get::<String>("nothing").await.unwrap(), None);
        assert_eq!(cache.get::<String>("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_raw_value_from_other_writer() {
        let (cache, store) = test_cache();
        store.set("legacy", b"plain text".to_vec()).await.unwrap();

        let value = cache.get::<String>("legacy").await.unwrap().unwrap();
        assert_eq!(value.raw(), Some(&b"plain text"[..]));
    }

    #[tokio::test]
    async fn test_set_skips_invalid_input() {
        let (cache, store) = test_cache();

        assert!(!cache.set("", "value", None).await.unwrap());
        assert!(!cache.set("key", "", None).await.unwrap());
        assert!(!cache.set("key", &None::<u32>, None).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_refreshes_ttl() {
        let (cache, store) = test_cache();

        cache.set("counter", &1, Some(100)).await.unwrap();
        assert_eq!(store.ttl("counter").await.unwrap(), KeyTtl::Expires(100));

        cache.set("counter", &2, None).await.unwrap();
        assert_eq!(store.ttl("counter").await.unwrap(), KeyTtl::Expires(86400));
    }

    #[tokio::test]
    async fn test_numeric_key_coercion() {
        let (cache, store) = test_cache();

        cache.set(42, &true, None).await.unwrap();
        assert!(store.exists("42").await.unwrap());
    }
}

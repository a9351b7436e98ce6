//! Hash operations: one logical map per key, each field encoded separately.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{skip, Cache};
use crate::codec::{decode, Decoded};
use crate::contract::{coerce_key, payload};
use crate::error::Result;

impl Cache {
    /// Sets one field of the hash at `name` and refreshes the key's TTL.
    ///
    /// Returns `false` without contacting the store if the key, field or
    /// value is invalid.
    pub async fn update_field<T: Serialize + ?Sized>(
        &self,
        name: impl Display,
        field: impl Display,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let (Some(key), Some(field)) = (coerce_key(name), coerce_key(field)) else {
            skip("update_field", "key or field");
            return Ok(false);
        };
        let Some(payload) = payload(value)? else {
            skip("update_field", "value");
            return Ok(false);
        };

        self.store.hset(&key, &field, payload).await?;
        self.refresh_ttl(&key, ttl).await?;
        Ok(true)
    }

    /// Reads one field of the hash at `name`.
    ///
    /// `None` if the key or the field does not exist.
    pub async fn field_value<T: DeserializeOwned>(
        &self,
        name: impl Display,
        field: impl Display,
    ) -> Result<Option<Decoded<T>>> {
        let (Some(key), Some(field)) = (coerce_key(name), coerce_key(field)) else {
            return Ok(None);
        };
        Ok(self.store.hget(&key, &field).await?.map(decode::<T>))
    }
}

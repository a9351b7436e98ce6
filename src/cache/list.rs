//! List operations.
//!
//! Pushes accept anything iterable: vectors, arrays, ranges, or lazy
//! iterator chains. Every iterable is flattened, including `Option`, maps
//! and `Vec<u8>`; use [`Cache::push_left_one`] or [`Cache::push_right_one`]
//! to push such a value as a single element.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{skip, Cache};
use crate::codec::{decode, Decoded};
use crate::contract::{coerce_key, payload};
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
enum End {
    Left,
    Right,
}

impl Cache {
    // == Push ==
    /// Pushes each item of `data` onto the head of the list at `name`.
    ///
    /// Items are pushed in iteration order, so the last item ends up first.
    /// Returns the list length, or `None` if nothing was written.
    pub async fn push_left<I>(&self, name: impl Display, data: I, ttl: Option<u64>) -> Result<Option<u64>>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        self.push(End::Left, name, data, ttl).await
    }

    /// Pushes each item of `data` onto the tail of the list at `name`.
    pub async fn push_right<I>(&self, name: impl Display, data: I, ttl: Option<u64>) -> Result<Option<u64>>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        self.push(End::Right, name, data, ttl).await
    }

    /// Pushes one value onto the head of the list, without flattening it.
    pub async fn push_left_one<T: Serialize + ?Sized>(
        &self,
        name: impl Display,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<Option<u64>> {
        self.push(End::Left, name, std::iter::once(value), ttl).await
    }

    /// Pushes one value onto the tail of the list, without flattening it.
    pub async fn push_right_one<T: Serialize + ?Sized>(
        &self,
        name: impl Display,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<Option<u64>> {
        self.push(End::Right, name, std::iter::once(value), ttl).await
    }

    async fn push<I>(&self, end: End, name: impl Display, data: I, ttl: Option<u64>) -> Result<Option<u64>>
    where
        I: IntoIterator,
        I::Item: Serialize,
    {
        let Some(key) = coerce_key(name) else {
            skip("push", "key");
            return Ok(None);
        };

        // Blank items are dropped individually
        let mut values = Vec::new();
        for item in data {
            if let Some(payload) = payload(&item)? {
                values.push(payload);
            }
        }
        if values.is_empty() {
            skip("push", "data");
            return Ok(None);
        }

        let len = match end {
            End::Left => self.store.lpush(&key, values).await?,
            End::Right => self.store.rpush(&key, values).await?,
        };
        self.refresh_ttl(&key, ttl).await?;
        Ok(Some(len))
    }

    // == Range ==
    /// Reads up to `limit` items starting `skip` items from the head.
    pub async fn list_range<T: DeserializeOwned>(
        &self,
        name: impl Display,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(Vec::new());
        };
        // Indexes past i64::MAX cannot name an element
        let Ok(start) = i64::try_from(skip) else {
            return Ok(Vec::new());
        };
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let stop = start.saturating_add(limit - 1);
        let items = self.store.lrange(&key, start, stop).await?;
        Ok(items.into_iter().map(decode::<T>).collect())
    }

    // == Pop ==
    /// Removes and returns the head of the list, `None` when empty.
    pub async fn pop_left<T: DeserializeOwned>(&self, name: impl Display) -> Result<Option<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(None);
        };
        Ok(self.store.lpop(&key).await?.map(decode::<T>))
    }

    /// Removes and returns the tail of the list, `None` when empty.
    pub async fn pop_right<T: DeserializeOwned>(&self, name: impl Display) -> Result<Option<Decoded<T>>> {
        let Some(key) = coerce_key(name) else {
            return Ok(None);
        };
        Ok(self.store.rpop(&key).await?.map(decode::<T>))
    }
}

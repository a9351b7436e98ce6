//! Raw command table for the in-memory store.
//!
//! Resolves command names (case-insensitive) onto the typed store methods.
//! Names outside the table are reported as unsupported.

use super::{arity, MemoryStore};
use crate::error::{CacheError, Result};
use crate::store::{Reply, Store};

/// Positional command arguments.
struct Args<'a> {
    command: &'a str,
    values: Vec<Vec<u8>>,
}

impl Args<'_> {
    fn exactly(&self, count: usize) -> Result<()> {
        if self.values.len() == count {
            Ok(())
        } else {
            Err(arity(&self.command.to_ascii_lowercase()))
        }
    }

    fn at_least(&self, count: usize) -> Result<()> {
        if self.values.len() >= count {
            Ok(())
        } else {
            Err(arity(&self.command.to_ascii_lowercase()))
        }
    }

    fn text(&self, index: usize) -> Result<String> {
        String::from_utf8(self.values[index].clone())
            .map_err(|_| CacheError::Store("ERR invalid UTF-8 argument".to_string()))
    }

    fn int(&self, index: usize) -> Result<i64> {
        self.text(index)?.parse().map_err(|_| {
            CacheError::Store("ERR value is not an integer or out of range".to_string())
        })
    }
}

pub(super) async fn dispatch(store: &MemoryStore, name: &str, values: Vec<Vec<u8>>) -> Result<Reply> {
    let command = name.to_ascii_uppercase();
    let args = Args {
        command: &command,
        values,
    };

    match command.as_str() {
        "PING" => Ok(match args.values.first() {
            Some(message) => Reply::Bulk(message.clone()),
            None => Reply::Status("PONG".to_string()),
        }),
        "GET" => {
            args.exactly(1)?;
            Ok(store.get(&args.text(0)?).await?.into())
        }
        "SET" => {
            args.exactly(2)?;
            store.set(&args.text(0)?, args.values[1].clone()).await?;
            Ok(Reply::ok())
        }
        "DEL" | "EXISTS" => {
            args.at_least(1)?;
            let mut count = 0;
            for index in 0..args.values.len() {
                let key = args.text(index)?;
                let hit = if command == "DEL" {
                    store.delete(&key).await?
                } else {
                    store.exists(&key).await?
                };
                count += hit as i64;
            }
            Ok(Reply::Int(count))
        }
        "STRLEN" => {
            args.exactly(1)?;
            let len = store.get(&args.text(0)?).await?.map_or(0, |bytes| bytes.len());
            Ok(Reply::Int(len as i64))
        }
        "APPEND" => {
            args.exactly(2)?;
            let len = store.append(&args.text(0)?, &args.values[1]).await?;
            Ok(Reply::Int(len as i64))
        }
        "TYPE" => {
            args.exactly(1)?;
            let kind = store.key_type(&args.text(0)?).await?;
            Ok(Reply::Status(kind.to_string()))
        }
        "TTL" => {
            args.exactly(1)?;
            Ok(Reply::Int(store.ttl(&args.text(0)?).await?.as_reply()))
        }
        "PERSIST" => {
            args.exactly(1)?;
            Ok(store.persist(&args.text(0)?).await?.into())
        }
        "EXPIRE" => {
            args.exactly(2)?;
            let seconds = args.int(1)?.max(0) as u64;
            Ok(store.expire(&args.text(0)?, seconds).await?.into())
        }
        "HGET" => {
            args.exactly(2)?;
            Ok(store.hget(&args.text(0)?, &args.text(1)?).await?.into())
        }
        "HEXISTS" => {
            args.exactly(2)?;
            let found = store.hget(&args.text(0)?, &args.text(1)?).await?.is_some();
            Ok(found.into())
        }
        "SISMEMBER" => {
            args.exactly(2)?;
            Ok(store.sismember(&args.text(0)?, &args.values[1]).await?.into())
        }
        "HLEN" | "LLEN" | "SCARD" | "ZCARD" => {
            args.exactly(1)?;
            let key = args.text(0)?;
            let len = match command.as_str() {
                "HLEN" => store.hlen(&key).await?,
                "LLEN" => store.llen(&key).await?,
                "SCARD" => store.scard(&key).await?,
                _ => store.zcard(&key).await?,
            };
            Ok(Reply::Int(len as i64))
        }
        "DBSIZE" => {
            args.exactly(0)?;
            Ok(Reply::Int(store.len().await as i64))
        }
        _ => Err(CacheError::UnsupportedOperation(name.to_string())),
    }
}

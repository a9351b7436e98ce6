//! Key/Value Contract
//!
//! Validity rules shared by keys and values, composite key packing, and the
//! TTL constants every write relies on.

use std::fmt::Display;

use serde::Serialize;

use crate::codec;
use crate::error::Result;

// == Public Constants ==
/// TTL in seconds applied by writes without an explicit TTL (one day)
pub const DEFAULT_TTL: u64 = 86400;

/// Separator joining composite key components
pub const KEY_SEPARATOR: &str = "_";

// Encoded forms of the absence value and the empty string.
const BLANK_PAYLOADS: [&[u8]; 2] = [b"null", b"\"\""];

// == Validity ==
/// Returns false when `value` is absent or empty.
///
/// A value is judged by its encoded form, so `None`, `()` and `""` are all
/// invalid while `0` and `false` are valid.
pub fn valid<T: Serialize + ?Sized>(value: &T) -> bool {
    matches!(payload(value), Ok(Some(_)))
}

/// Coerces a key to its string form, rejecting empty keys.
pub fn coerce_key(name: impl Display) -> Option<String> {
    let key = name.to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Encodes a value for storage, or `None` when the value is invalid.
pub fn payload<T: Serialize + ?Sized>(value: &T) -> Result<Option<Vec<u8>>> {
    let bytes = codec::encode(value)?;
    if BLANK_PAYLOADS.contains(&bytes.as_slice()) {
        Ok(None)
    } else {
        Ok(Some(bytes))
    }
}

// == Composite Keys ==
/// Joins components into one composite key.
pub fn pack<I>(components: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    components
        .into_iter()
        .map(|component| component.to_string())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Splits a composite key back into its components.
///
/// Lossy for components that themselves contained the separator.
pub fn unpack(key: &str) -> Vec<String> {
    key.split(KEY_SEPARATOR).map(str::to_string).collect()
}

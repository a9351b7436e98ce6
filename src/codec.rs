//! Serialization Codec
//!
//! Converts application values to opaque JSON payloads and back. Decoding is
//! tolerant: bytes that do not decode as the requested type are handed back
//! unchanged, so values written by other processes stay readable.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

// == Decoded ==
/// Result of a tolerant decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Payload decoded as the requested type
    Value(T),
    /// Payload could not be decoded; original bytes
    Raw(Vec<u8>),
}

impl<T> Decoded<T> {
    /// Returns the decoded value, discarding raw payloads.
    pub fn into_value(self) -> Option<T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Raw(_) => None,
        }
    }

    /// Borrows the decoded value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Raw(_) => None,
        }
    }

    /// Borrows the raw payload when decoding was not possible.
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Decoded::Value(_) => None,
            Decoded::Raw(bytes) => Some(bytes),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Decoded::Raw(_))
    }
}

// == Encode ==
/// Encodes a value into a stored payload.
///
/// Fails only for values JSON cannot represent, such as maps keyed by
/// non-string types.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

// == Decode ==
/// Decodes a stored payload, falling back to the raw bytes.
///
/// Empty input is never decoded and comes back as an empty raw payload.
pub fn decode<T: DeserializeOwned>(bytes: Vec<u8>) -> Decoded<T> {
    if bytes.is_empty() {
        return Decoded::Raw(bytes);
    }
    match serde_json::from_slice(&bytes) {
        Ok(value) => Decoded::Value(value),
        Err(_) => Decoded::Raw(bytes),
    }
}

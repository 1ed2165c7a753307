//! Record codec
//!
//! Every persisted record and every transaction goes through bincode so the
//! bytes (and therefore the app hash and sign-bytes) are identical on every
//! replica.

use crate::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Serialize a value
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

/// Deserialize a value
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

//! # Value Serialization
//!
//! The codec seam between in-memory payload values and their byte encoding.
//! The pipelines only see the [`WireCodec`] trait; which concrete encoding a
//! deployment speaks is chosen when the collaborator stack is assembled.
//!
//! Provided implementations:
//! - [`BincodeCodec`]: compact binary (default choice)
//! - [`JsonCodec`]: human-readable, for debugging and interop
//! - [`RawCodec`]: identity over `Vec<u8>`, for pre-encoded payloads and tests
//!
//! All implementations are deterministic, so `decode(encode(v)) == v`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::error::{Result, SessionError};

/// Reversible transform between a payload value and its byte encoding.
pub trait WireCodec<V>: Send + Sync {
    fn encode(&self, value: &V) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<V>;
}

/// Bincode-backed codec for any serde value type.
pub struct BincodeCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> Default for BincodeCodec<V> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> WireCodec<V> for BincodeCodec<V>
where
    V: Serialize + DeserializeOwned + Send,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| SessionError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        bincode::deserialize(bytes).map_err(|e| SessionError::Decode(e.to_string()))
    }
}

/// JSON codec, slower but readable on the wire.
pub struct JsonCodec<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> Default for JsonCodec<V> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> WireCodec<V> for JsonCodec<V>
where
    V: Serialize + DeserializeOwned + Send,
{
    fn encode(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| SessionError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Decode(e.to_string()))
    }
}

/// Identity codec over raw byte payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawCodec;

impl WireCodec<Vec<u8>> for RawCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

//! Value Serializers
//!
//! Convert cached values to and from the bytes a remote store holds.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SerializationError(pub String);

/// Pluggable value encoding for remote-backed stores.
pub trait ValueSerializer<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<Vec<u8>, SerializationError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<V, SerializationError>;
}

// == Bytes ==
/// Passes byte arrays through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl ValueSerializer<Vec<u8>> for BytesSerializer {
    fn serialize(&self, value: &Vec<u8>) -> Result<Vec<u8>, SerializationError> {
        Ok(value.clone())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>, SerializationError> {
        Ok(bytes.to_vec())
    }
}

// == String ==
/// UTF-8 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringSerializer;

impl ValueSerializer<String> for StringSerializer {
    fn serialize(&self, value: &String) -> Result<Vec<u8>, SerializationError> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, SerializationError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SerializationError(format!("invalid UTF-8: {e}")))
    }
}

// == JSON ==
/// Any serde type, encoded as JSON.
#[derive(Debug)]
pub struct JsonSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonSerializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> ValueSerializer<T> for JsonSerializer<T> {
    fn serialize(&self, value: &T) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec(value).map_err(|e| SerializationError(format!("JSON encode: {e}")))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T, SerializationError> {
        serde_json::from_slice(bytes).map_err(|e| SerializationError(format!("JSON decode: {e}")))
    }
}

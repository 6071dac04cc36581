//! Remote Tier Module
//!
//! The adapter boundary to an external key-value server, value
//! serializers, a remote-backed [`crate::cache::Cache`] and an in-memory
//! reference adapter.

mod adapter;
mod memory;
mod serializer;
mod store;

pub use adapter::{RemoteError, RemoteStoreAdapter, TTL_MISSING, TTL_PERSISTENT};
pub use memory::InMemoryAdapter;
pub use serializer::{
    BytesSerializer, JsonSerializer, SerializationError, StringSerializer, ValueSerializer,
};
pub use store::{ttl_to_secs, RemoteStore};

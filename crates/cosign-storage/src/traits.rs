//! Storage trait definitions.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Key-value storage interface over named column families.
///
/// Abstracts the RocksDB backend so services can be tested against a
/// throwaway database.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get a value by key from a column family.
    ///
    /// Returns `Ok(Some(value))` if the key exists, `Ok(None)` otherwise.
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    /// Put a key-value pair into a column family.
    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync;

    /// Delete a key from a column family.
    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync;

    /// Check whether a key exists in a column family.
    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync;

    /// Range query: all entries whose serialized key starts with the
    /// serialized prefix.
    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned;

    /// Full scan of a column family.
    async fn scan_all<V>(&self, cf: &str) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned;

    /// Number of entries in a column family (full scan; admin use only).
    async fn count(&self, cf: &str) -> Result<u64>;

    /// Create a new batch for atomic multi-record writes.
    fn batch(&self) -> Box<dyn Batch>;
}

/// Batch of writes committed atomically.
///
/// Works with pre-serialized bytes to stay object safe; use [`BatchExt`]
/// for the typed variants. Dropping a batch without committing discards
/// it.
#[async_trait]
pub trait Batch: Send {
    /// Queue a pre-serialized put.
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Queue a pre-serialized delete.
    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()>;

    /// Commit all queued writes atomically.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Typed helpers over [`Batch`].
pub trait BatchExt: Batch {
    /// Queue a put, serializing key and value.
    fn put<K, V>(&mut self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        self.put_raw(cf, serialize_key(key)?, serialize_value(value)?)
    }

    /// Queue a delete, serializing the key.
    fn delete<K>(&mut self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize,
    {
        let key_bytes = serialize_key(key)?;
        self.delete_raw(cf, key_bytes)
    }
}

impl<T: Batch + ?Sized> BatchExt for T {}

pub(crate) fn serialize_key<K: Serialize>(key: &K) -> Result<Vec<u8>> {
    bincode::serialize(key).map_err(|e| crate::errors::StorageError::Serialization(e.to_string()))
}

pub(crate) fn serialize_value<V: Serialize>(value: &V) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| crate::errors::StorageError::Serialization(e.to_string()))
}

pub(crate) fn deserialize_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    bincode::deserialize(bytes)
        .map_err(|e| crate::errors::StorageError::Deserialization(e.to_string()))
}

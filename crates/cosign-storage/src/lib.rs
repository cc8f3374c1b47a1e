//! # cosign-storage
//!
//! Persistence layer for the cooperative signing service: a small
//! key-value interface with one column family per logical table, backed by
//! RocksDB. RocksDB's write-ahead log covers the journaling requirement;
//! multi-record changes go through atomic write batches.

pub mod column_families;
pub mod errors;
pub mod rocksdb_impl;
pub mod traits;

pub use errors::{Result, StorageError};
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};

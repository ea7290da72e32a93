//! Storage capabilities behind the favorites store.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use super::types::FavoriteRecord;

/// Errors from a storage backend.
///
/// None of these reach callers of the store: they decide the storage tier
/// at startup and are logged afterwards.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Which backend the store ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    Structured,
    KeyValue,
    Memory,
}

/// Durable per-record storage.
pub trait RecordStore: Send + Sync {
    /// Prepares the store; an error means this tier cannot be used.
    fn open(&self) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn read_all(&self) -> impl Future<Output = Result<Vec<FavoriteRecord>, StorageError>> + Send;

    /// Inserts or replaces the record for its train number.
    fn put(&self, record: &FavoriteRecord) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Deletes a record. Deleting a missing record succeeds.
    fn delete(&self, train_number: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Synchronous string storage holding whole JSON blobs.
pub trait KeyValueStore: Send + Sync {
    /// Checks the store is usable; an error means this tier cannot be used.
    fn probe(&self) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: RecordStore> RecordStore for Arc<T> {
    fn open(&self) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).open()
    }

    fn read_all(&self) -> impl Future<Output = Result<Vec<FavoriteRecord>, StorageError>> + Send {
        (**self).read_all()
    }

    fn put(
        &self,
        record: &FavoriteRecord,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).put(record)
    }

    fn delete(&self, train_number: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(train_number)
    }
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn probe(&self) -> Result<(), StorageError> {
        (**self).probe()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

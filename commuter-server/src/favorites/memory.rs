//! In-memory storage backends.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::backend::{KeyValueStore, RecordStore, StorageError};
use super::types::FavoriteRecord;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records held in a map. Can be switched off or made read-only to stand
/// in for storage that is missing or failing.
#[derive(Debug)]
pub struct MemoryRecords {
    records: Mutex<BTreeMap<String, FavoriteRecord>>,
    available: AtomicBool,
    writable: AtomicBool,
    opens: AtomicUsize,
}

impl Default for MemoryRecords {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            available: AtomicBool::new(true),
            writable: AtomicBool::new(true),
            opens: AtomicUsize::new(0),
        }
    }
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `open` fails.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    /// Seeds records without going through the trait.
    pub fn with_records(records: impl IntoIterator<Item = FavoriteRecord>) -> Self {
        let store = Self::default();
        lock(&store.records).extend(
            records
                .into_iter()
                .map(|record| (record.train_number.clone(), record)),
        );
        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// When false, `put` and `delete` fail but reads still work.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    pub fn get(&self, train_number: &str) -> Option<FavoriteRecord> {
        lock(&self.records).get(train_number).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory records switched off".into()))
        }
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        self.check_available()?;
        if self.writable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory records are read-only".into()))
        }
    }
}

impl RecordStore for MemoryRecords {
    async fn open(&self) -> Result<(), StorageError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        // Let concurrent initializers interleave
        tokio::task::yield_now().await;
        self.check_available()
    }

    async fn read_all(&self) -> Result<Vec<FavoriteRecord>, StorageError> {
        self.check_available()?;
        Ok(lock(&self.records).values().cloned().collect())
    }

    async fn put(&self, record: &FavoriteRecord) -> Result<(), StorageError> {
        self.check_writable()?;
        lock(&self.records).insert(record.train_number.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, train_number: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        lock(&self.records).remove(train_number);
        Ok(())
    }
}

/// String values held in a map, with an availability switch.
#[derive(Debug)]
pub struct MemoryKv {
    values: Mutex<HashMap<String, String>>,
    available: AtomicBool,
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        lock(&store.values).insert(key.to_string(), value.to_string());
        store
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Current value without the availability check.
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory key-value store switched off".into()))
        }
    }
}

impl KeyValueStore for MemoryKv {
    fn probe(&self) -> Result<(), StorageError> {
        self.check_available()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        lock(&self.values).remove(key);
        Ok(())
    }
}

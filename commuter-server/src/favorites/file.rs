//! File-backed favorites storage.
//!
//! `RecordDir` keeps one JSON file per train in a directory and is the
//! structured tier. `JsonFileKv` keeps a single JSON object of string
//! values and is the key-value tier. Both write to a temporary file and
//! rename it into place so a crash never leaves a half-written file.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::backend::{KeyValueStore, RecordStore, StorageError};
use super::types::FavoriteRecord;

/// Directory of `{train_number}.json` records.
#[derive(Debug, Clone)]
pub struct RecordDir {
    dir: PathBuf,
}

impl RecordDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// File for a train number. Only ASCII alphanumerics are accepted so a
    /// key can never escape the directory.
    fn record_path(&self, train_number: &str) -> Result<PathBuf, StorageError> {
        if train_number.is_empty() || !train_number.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidKey(train_number.to_string()));
        }
        Ok(self.dir.join(format!("{train_number}.json")))
    }
}

impl RecordStore for RecordDir {
    async fn open(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let meta = tokio::fs::metadata(&self.dir).await?;
        if meta.permissions().readonly() {
            return Err(StorageError::Unavailable(format!(
                "{} is read-only",
                self.dir.display()
            )));
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<FavoriteRecord>, StorageError> {
        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let contents = tokio::fs::read_to_string(&path).await?;
            match serde_json::from_str::<FavoriteRecord>(&contents) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable favorite"),
            }
        }

        records.sort_by(|a, b| a.train_number.cmp(&b.train_number));
        debug!(count = records.len(), dir = %self.dir.display(), "read favorite records");
        Ok(records)
    }

    async fn put(&self, record: &FavoriteRecord) -> Result<(), StorageError> {
        let path = self.record_path(&record.train_number)?;
        let json = serde_json::to_vec_pretty(record)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, train_number: &str) -> Result<(), StorageError> {
        let path = self.record_path(train_number)?;
        match tokio::fs::remove_file(&path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// A JSON object of string values in one file.
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<HashMap<String, String>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "key-value file is corrupt, treating as empty"
                );
                Ok(HashMap::new())
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileKv {
    fn probe(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        if self.path.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is a directory",
                self.path.display()
            )));
        }
        self.read_map().map(|_| ())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

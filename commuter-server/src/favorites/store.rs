//! The favorites store: an in-memory mirror in front of tiered storage.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{OnceCell, broadcast};
use tracing::{debug, info, warn};

use super::backend::{KeyValueStore, RecordStore, StorageError, StorageTier};
use super::types::{
    FavoriteRecord, FavoriteTrainData, FavoriteUpdate, FavoritesEvent, LegacyFavorite,
};

/// Key of the favorites blob in key-value storage.
pub const LEGACY_KEY: &str = "favoriteTrains";

const EVENT_CAPACITY: usize = 64;

/// Favorited trains by train number.
///
/// Reads are served from memory. Writes update memory first and then
/// persist to whichever tier was selected at initialization; persistence
/// failures are logged and never surface to the caller. Initialization is
/// lazy, runs once, and is shared by concurrent callers.
pub struct FavoritesStore<S, K> {
    records: S,
    kv: K,
    tier: OnceCell<StorageTier>,
    mirror: RwLock<HashMap<String, FavoriteTrainData>>,
    /// Held while the key-value blob is serialized and written
    persist: Mutex<()>,
    events: broadcast::Sender<FavoritesEvent>,
}

impl<S: RecordStore, K: KeyValueStore> FavoritesStore<S, K> {
    pub fn new(records: S, kv: K) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            records,
            kv,
            tier: OnceCell::new(),
            mirror: RwLock::new(HashMap::new()),
            persist: Mutex::new(()),
            events,
        }
    }

    /// Selects a tier, loads and migrates stored favorites and sweeps
    /// expired ones. Later calls return the memoized tier.
    pub async fn initialize(&self) -> StorageTier {
        *self.tier.get_or_init(|| self.load()).await
    }

    /// The selected tier, once initialization has finished.
    pub fn tier(&self) -> Option<StorageTier> {
        self.tier.get().copied()
    }

    pub async fn get_all(&self) -> HashMap<String, FavoriteTrainData> {
        self.initialize().await;
        self.get_all_sync()
    }

    /// Current snapshot, without waiting for initialization.
    pub fn get_all_sync(&self) -> HashMap<String, FavoriteTrainData> {
        self.read().clone()
    }

    pub fn get(&self, train_number: &str) -> Option<FavoriteTrainData> {
        self.read().get(train_number).cloned()
    }

    /// `highlighted` flag of the favorite, false if there is none.
    pub fn is_favorited(&self, train_number: &str) -> bool {
        self.read()
            .get(train_number)
            .is_some_and(|data| data.highlighted)
    }

    pub async fn set(&self, train_number: &str, data: FavoriteTrainData) {
        let tier = self.initialize().await;
        self.write().insert(train_number.to_string(), data.clone());
        self.persist_set(tier, train_number, data).await;
    }

    /// Removes a favorite. Returns whether it existed.
    pub async fn remove(&self, train_number: &str) -> bool {
        let tier = self.initialize().await;
        let existed = self.write().remove(train_number).is_some();

        let result = match tier {
            StorageTier::Structured => self.records.delete(train_number).await,
            StorageTier::KeyValue => self.write_blob(),
            StorageTier::Memory => Ok(()),
        };
        if let Err(e) = result {
            warn!(train_number, error = %e, "failed to delete favorite");
        }

        if existed {
            self.notify(FavoritesEvent::Removed {
                train_number: train_number.to_string(),
            });
        }
        existed
    }

    /// Merges `update` into an existing favorite. Does nothing and returns
    /// `None` when the train is not a favorite.
    pub async fn update(
        &self,
        train_number: &str,
        update: FavoriteUpdate,
    ) -> Option<FavoriteTrainData> {
        let tier = self.initialize().await;
        let data = {
            let mut mirror = self.write();
            let data = mirror.get_mut(train_number)?;
            data.apply(update);
            data.clone()
        };
        self.persist_set(tier, train_number, data.clone()).await;
        Some(data)
    }

    /// Deletes favorites whose `removeAfter` is before `now` from memory and
    /// storage. Returns how many were removed.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
        let tier = self.initialize().await;
        self.sweep(tier, now).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.events.subscribe()
    }

    /// Persists a favorite already in the mirror and announces it.
    async fn persist_set(&self, tier: StorageTier, train_number: &str, data: FavoriteTrainData) {
        let result = match tier {
            StorageTier::Structured => {
                let record = FavoriteRecord {
                    train_number: train_number.to_string(),
                    data: data.clone(),
                };
                self.records.put(&record).await
            }
            StorageTier::KeyValue => self.write_blob(),
            StorageTier::Memory => Ok(()),
        };
        if let Err(e) = result {
            warn!(train_number, error = %e, "failed to persist favorite");
        }

        self.notify(FavoritesEvent::Set {
            train_number: train_number.to_string(),
            data,
        });
    }

    async fn load(&self) -> StorageTier {
        let tier = self.select_tier().await;

        let loaded = match tier {
            StorageTier::Structured => {
                let mut favorites = self.read_records().await;
                self.migrate_legacy(&mut favorites).await;
                favorites
            }
            StorageTier::KeyValue => self.read_blob().unwrap_or_default(),
            StorageTier::Memory => HashMap::new(),
        };

        info!(?tier, count = loaded.len(), "loaded favorites");
        self.write().extend(loaded);

        // Not cleanup_expired: that would wait on this initialization
        self.sweep(tier, Utc::now()).await;
        tier
    }

    async fn select_tier(&self) -> StorageTier {
        match self.records.open().await {
            Ok(()) => return StorageTier::Structured,
            Err(e) => warn!(error = %e, "structured storage unavailable"),
        }

        match self.kv.probe() {
            Ok(()) => StorageTier::KeyValue,
            Err(e) => {
                warn!(error = %e, "key-value storage unavailable, favorites will not persist");
                StorageTier::Memory
            }
        }
    }

    async fn read_records(&self) -> HashMap<String, FavoriteTrainData> {
        match self.records.read_all().await {
            Ok(records) => records
                .into_iter()
                .map(|record| (record.train_number, record.data))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to read favorites");
                HashMap::new()
            }
        }
    }

    /// The key-value blob, or `None` if there is none.
    ///
    /// A blob that does not parse reads as empty.
    fn read_blob(&self) -> Option<HashMap<String, FavoriteTrainData>> {
        let json = match self.kv.get(LEGACY_KEY) {
            Ok(json) => json?,
            Err(e) => {
                debug!(error = %e, "no key-value favorites");
                return None;
            }
        };

        let parsed: HashMap<String, LegacyFavorite> = match serde_json::from_str(&json) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored favorites are corrupt, ignoring them");
                HashMap::new()
            }
        };

        Some(
            parsed
                .into_iter()
                .map(|(train, legacy)| {
                    let data = legacy.into_data(&train);
                    (train, data)
                })
                .collect(),
        )
    }

    /// Writes the whole mirror as the key-value blob.
    ///
    /// The snapshot is taken under the persistence lock, so the last write
    /// to land is always the newest mirror.
    fn write_blob(&self) -> Result<(), StorageError> {
        let _persist = self.persist.lock().unwrap_or_else(PoisonError::into_inner);
        let json = serde_json::to_string(&*self.read())?;
        self.kv.set(LEGACY_KEY, &json)
    }

    /// Copies key-value favorites into structured storage, then drops the
    /// blob. Entries already in structured storage win. The blob is kept if
    /// any copy fails so the next start can retry.
    async fn migrate_legacy(&self, favorites: &mut HashMap<String, FavoriteTrainData>) {
        let Some(legacy) = self.read_blob() else {
            return;
        };

        let pending: Vec<FavoriteRecord> = legacy
            .into_iter()
            .filter(|(train, _)| !favorites.contains_key(train))
            .map(|(train_number, data)| FavoriteRecord { train_number, data })
            .collect();

        let results = join_all(pending.iter().map(|record| self.records.put(record))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();

        let migrated = pending.len() - failed;
        for record in pending {
            favorites.insert(record.train_number, record.data);
        }

        if failed > 0 {
            warn!(migrated, failed, "legacy favorites partly migrated, keeping blob");
            return;
        }

        match self.kv.remove(LEGACY_KEY) {
            Ok(()) => info!(migrated, "migrated legacy favorites"),
            Err(e) => warn!(error = %e, "failed to clear legacy favorites"),
        }
    }

    async fn sweep(&self, tier: StorageTier, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = {
            let mut mirror = self.write();
            let expired: Vec<String> = mirror
                .iter()
                .filter(|(_, data)| data.is_expired(now))
                .map(|(train, _)| train.clone())
                .collect();
            for train in &expired {
                mirror.remove(train);
            }
            expired
        };

        if expired.is_empty() {
            return 0;
        }

        match tier {
            StorageTier::Structured => {
                let deletes = expired.iter().map(|train| self.records.delete(train));
                for (train, result) in expired.iter().zip(join_all(deletes).await) {
                    if let Err(e) = result {
                        warn!(
                            train_number = %train,
                            error = %e,
                            "failed to delete expired favorite"
                        );
                    }
                }
            }
            StorageTier::KeyValue => {
                if let Err(e) = self.write_blob() {
                    warn!(error = %e, "failed to persist favorites after sweep");
                }
            }
            StorageTier::Memory => {}
        }

        for train_number in &expired {
            self.notify(FavoritesEvent::Removed {
                train_number: train_number.clone(),
            });
        }

        info!(count = expired.len(), "removed expired favorites");
        expired.len()
    }

    fn notify(&self, event: FavoritesEvent) {
        // Sending only fails when nobody is subscribed
        let _ = self.events.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, FavoriteTrainData>> {
        self.mirror.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, FavoriteTrainData>> {
        self.mirror.write().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Favorited trains.
//!
//! Riders mark trains they care about; the store remembers them across
//! restarts, flags track changes on the next refresh and forgets each one
//! shortly after it has departed.
//!
//! Storage is picked once, in order of preference:
//! 1. structured records ([`RecordStore`], e.g. [`RecordDir`]),
//! 2. a single key-value blob ([`KeyValueStore`], e.g. [`JsonFileKv`]),
//! 3. memory only.
//!
//! Favorites written by older versions to the key-value blob are moved
//! into structured storage on first start.

mod backend;
mod file;
mod memory;
mod store;
mod types;

pub use backend::{KeyValueStore, RecordStore, StorageError, StorageTier};
pub use file::{JsonFileKv, RecordDir};
pub use memory::{MemoryKv, MemoryRecords};
pub use store::{FavoritesStore, LEGACY_KEY};
pub use types::{FavoriteRecord, FavoriteTrainData, FavoriteUpdate, FavoritesEvent, LegacyFavorite};

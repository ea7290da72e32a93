//! Application state for the web layer.

use std::sync::Arc;

use crate::departures::{Departures, Feed};
use crate::favorites::{FavoritesStore, JsonFileKv, RecordDir};

/// Favorites persisted under the configured directory.
pub type Favorites = FavoritesStore<RecordDir, JsonFileKv>;

/// Shared application state.
///
/// Holds the one data access layer and the one favorites store built by
/// `main`.
#[derive(Clone)]
pub struct AppState {
    /// Cached station and train data
    pub departures: Arc<Departures<Feed>>,

    /// Favorited trains
    pub favorites: Arc<Favorites>,
}

impl AppState {
    pub fn new(departures: Departures<Feed>, favorites: Favorites) -> Self {
        Self {
            departures: Arc::new(departures),
            favorites: Arc::new(favorites),
        }
    }
}

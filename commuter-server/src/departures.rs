//! Cached access to stations and departures.
//!
//! Wraps a [`TrainFeed`] with two [`ResponseCache`]s: one for the station
//! list and one for train lists per origin/destination pair. Train lists
//! are stored after journey filtering, so a cache hit needs no further
//! work. When the feed fails (including rate limiting) the last cached
//! value is served even if expired; the error only reaches the caller when
//! nothing was ever cached for the key.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::cache::{CacheConfig, ResponseCache};
use crate::digitraffic::{DigitrafficClient, FeedError, FixtureFeed};
use crate::domain::{Coordinate, FINLAND, Station, StationCode, TrainRun};
use crate::journey::{Journey, filter_and_slice};

/// Cache key of the station list.
const STATIONS_KEY: &str = "stations";

/// Source of raw station and train data.
///
/// This abstraction allows the data access layer to be tested with
/// scripted responses.
pub trait TrainFeed: Send + Sync {
    /// All passenger stations.
    fn fetch_stations(&self) -> impl Future<Output = Result<Vec<Station>, FeedError>> + Send;

    /// Upcoming trains at `station`, each with its full timetable.
    fn fetch_trains(
        &self,
        station: &StationCode,
    ) -> impl Future<Output = Result<Vec<TrainRun>, FeedError>> + Send;
}

impl TrainFeed for DigitrafficClient {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FeedError> {
        DigitrafficClient::fetch_stations(self).await
    }

    async fn fetch_trains(&self, station: &StationCode) -> Result<Vec<TrainRun>, FeedError> {
        DigitrafficClient::fetch_trains(self, station).await
    }
}

impl TrainFeed for FixtureFeed {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FeedError> {
        FixtureFeed::fetch_stations(self).await
    }

    async fn fetch_trains(&self, station: &StationCode) -> Result<Vec<TrainRun>, FeedError> {
        FixtureFeed::fetch_trains(self, station).await
    }
}

/// Either the live API or saved fixtures, chosen at startup.
#[derive(Debug, Clone)]
pub enum Feed {
    Live(DigitrafficClient),
    Fixture(FixtureFeed),
}

impl TrainFeed for Feed {
    async fn fetch_stations(&self) -> Result<Vec<Station>, FeedError> {
        match self {
            Feed::Live(client) => client.fetch_stations().await,
            Feed::Fixture(fixture) => fixture.fetch_stations().await,
        }
    }

    async fn fetch_trains(&self, station: &StationCode) -> Result<Vec<TrainRun>, FeedError> {
        match self {
            Feed::Live(client) => client.fetch_trains(station).await,
            Feed::Fixture(fixture) => fixture.fetch_trains(station).await,
        }
    }
}

/// A station and its distance from a query point.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_km: f64,
}

/// Data access layer: feed plus response caches.
pub struct Departures<F> {
    feed: F,
    stations: Mutex<ResponseCache<&'static str, Arc<Vec<Station>>>>,
    trains: Mutex<ResponseCache<String, Arc<Vec<TrainRun>>>>,
}

impl<F: TrainFeed> Departures<F> {
    pub fn new(feed: F, config: &CacheConfig) -> Self {
        Self {
            feed,
            stations: Mutex::new(ResponseCache::new(config.station_ttl, config.max_entries)),
            trains: Mutex::new(ResponseCache::new(config.train_ttl, config.max_entries)),
        }
    }

    /// Passenger stations, from cache when fresh.
    pub async fn stations(&self) -> Result<Arc<Vec<Station>>, FeedError> {
        let cached = lock(&self.stations).get(&STATIONS_KEY);
        if let Some(stations) = cached {
            debug!("station cache hit");
            return Ok(stations);
        }

        match self.feed.fetch_stations().await {
            Ok(stations) => {
                let stations = Arc::new(stations);
                lock(&self.stations).set(STATIONS_KEY, stations.clone());
                Ok(stations)
            }
            Err(e) => serve_stale(&self.stations, &STATIONS_KEY, e),
        }
    }

    /// Runs from `origin` to `destination`, trimmed and ordered.
    pub async fn trains(
        &self,
        origin: &StationCode,
        destination: &StationCode,
    ) -> Result<Arc<Vec<TrainRun>>, FeedError> {
        let key = train_key(origin, destination);

        let cached = lock(&self.trains).get(&key);
        if let Some(runs) = cached {
            debug!(%key, "train cache hit");
            return Ok(runs);
        }

        match self.feed.fetch_trains(origin).await {
            Ok(raw) => {
                let runs = Arc::new(filter_and_slice(&raw, origin, destination));
                debug!(%key, fetched = raw.len(), kept = runs.len(), "resolved journeys");
                lock(&self.trains).set(key, runs.clone());
                Ok(runs)
            }
            Err(e) => serve_stale(&self.trains, &key, e),
        }
    }

    /// Rider-facing views of [`Departures::trains`].
    pub async fn journeys(
        &self,
        origin: &StationCode,
        destination: &StationCode,
    ) -> Result<Vec<Journey>, FeedError> {
        let runs = self.trains(origin, destination).await?;
        Ok(runs
            .iter()
            .cloned()
            .filter_map(|run| Journey::from_run(run, origin, destination))
            .collect())
    }

    /// Stations closest to `point`, nearest first.
    ///
    /// Points outside Finland get no suggestions.
    pub async fn nearest_stations(
        &self,
        point: Coordinate,
        limit: usize,
    ) -> Result<Vec<NearbyStation>, FeedError> {
        if !FINLAND.contains(&point) {
            return Ok(Vec::new());
        }

        let stations = self.stations().await?;
        let mut nearby: Vec<NearbyStation> = stations
            .iter()
            .filter_map(|station| {
                let location = station.location?;
                Some(NearbyStation {
                    station: station.clone(),
                    distance_km: point.haversine_km(&location),
                })
            })
            .collect();

        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        nearby.truncate(limit);
        Ok(nearby)
    }

    /// Access the underlying feed for operations that bypass the cache.
    pub fn feed(&self) -> &F {
        &self.feed
    }

    /// Number of live train cache entries.
    pub fn cached_train_lists(&self) -> usize {
        lock(&self.trains).len()
    }
}

fn train_key(origin: &StationCode, destination: &StationCode) -> String {
    format!("{origin}-{destination}")
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Falls back to the last cached value for `key`, or returns `error`.
fn serve_stale<K, V>(
    cache: &Mutex<ResponseCache<K, V>>,
    key: &K,
    error: FeedError,
) -> Result<V, FeedError>
where
    K: Eq + std::hash::Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    let stale = lock(cache).get_stale(key);
    match stale {
        Some(value) => {
            if error.is_rate_limited() {
                warn!(?key, "rate limited, serving cached data");
            } else {
                warn!(?key, %error, "feed request failed, serving cached data");
            }
            Ok(value)
        }
        None => {
            warn!(?key, %error, "feed request failed with nothing cached");
            Err(error)
        }
    }
}

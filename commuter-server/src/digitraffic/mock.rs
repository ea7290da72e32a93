//! Fixture-backed feed for running without network access.
//!
//! Reads saved GraphQL responses from a directory laid out as
//!
//! ```text
//! stations.json        # response of the stations query
//! trains/HKI.json      # response of the trains query for HKI
//! trains/PSL.json
//! ```
//!
//! and serves them as if they came from the live endpoint.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{Station, StationCode, TrainRun};

use super::client::parse_envelope;
use super::convert::{convert_stations, convert_trains};
use super::error::FeedError;
use super::types::{StationsData, TrainsData};

/// Feed that serves pre-loaded fixture data.
#[derive(Debug, Clone)]
pub struct FixtureFeed {
    stations: Arc<Vec<Station>>,
    trains: Arc<HashMap<StationCode, Vec<TrainRun>>>,
}

impl FixtureFeed {
    /// Load fixtures from `data_dir`.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();

        let stations_json = read(&data_dir.join("stations.json"))?;
        let data: StationsData = parse_envelope(&stations_json)?;
        let stations = convert_stations(&data.stations.ok_or(FeedError::MissingData)?);

        let mut trains = HashMap::new();
        let trains_dir = data_dir.join("trains");
        let entries = std::fs::read_dir(&trains_dir).map_err(|e| fixture_error(&trains_dir, e))?;

        for entry in entries {
            let path = entry.map_err(|e| fixture_error(&trains_dir, e))?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(code) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| StationCode::parse(s).ok())
            else {
                continue;
            };

            let data: TrainsData = parse_envelope(&read(&path)?)?;
            let dtos = data
                .trains_by_station_and_quantity
                .ok_or(FeedError::MissingData)?;
            trains.insert(code, convert_trains(&dtos));
        }

        Ok(Self {
            stations: Arc::new(stations),
            trains: Arc::new(trains),
        })
    }

    pub async fn fetch_stations(&self) -> Result<Vec<Station>, FeedError> {
        Ok(self.stations.as_ref().clone())
    }

    /// Trains for `station`; unknown stations have no trains.
    pub async fn fetch_trains(&self, station: &StationCode) -> Result<Vec<TrainRun>, FeedError> {
        Ok(self.trains.get(station).cloned().unwrap_or_default())
    }
}

fn read(path: &Path) -> Result<String, FeedError> {
    std::fs::read_to_string(path).map_err(|e| fixture_error(path, e))
}

fn fixture_error(path: &Path, e: std::io::Error) -> FeedError {
    FeedError::Api {
        status: 0,
        message: format!("Failed to read fixture {}: {}", path.display(), e),
    }
}

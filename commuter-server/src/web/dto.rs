//! Data transfer objects for web requests and responses.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::departures::NearbyStation;
use crate::domain::{Station, format_duration, minutes_until};
use crate::favorites::FavoriteTrainData;
use crate::journey::Journey;

/// Query for departures between two stations.
#[derive(Debug, Deserialize)]
pub struct TrainsRequest {
    /// Origin station short code (case-insensitive)
    pub origin: String,

    /// Destination station short code (case-insensitive)
    pub destination: String,
}

/// Query for stations near a point.
#[derive(Debug, Deserialize)]
pub struct NearestRequest {
    pub lat: f64,
    pub lon: f64,

    /// Maximum number of results (default 5, capped at 20)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<Station>,
}

/// A station with its distance from the query point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStationResult {
    pub name: String,
    pub short_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
}

impl NearbyStationResult {
    /// `None` for stations without a location.
    pub fn from_nearby(nearby: &NearbyStation) -> Option<Self> {
        let location = nearby.station.location?;
        Some(Self {
            name: nearby.station.name.clone(),
            short_code: nearby.station.short_code.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            distance_km: (nearby.distance_km * 100.0).round() / 100.0,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NearestResponse {
    pub stations: Vec<NearbyStationResult>,
}

/// One departure in a trains response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResult {
    pub train_number: String,

    /// Line letter shown to riders, e.g. "I"
    pub line_id: String,

    pub journey_key: String,

    pub scheduled_departure: DateTime<Utc>,

    /// Live estimate, or the schedule when there is none
    pub departure: DateTime<Utc>,

    pub scheduled_arrival: DateTime<Utc>,

    pub arrival: DateTime<Utc>,

    /// Negative once the train has left
    pub minutes_until_departure: i64,

    pub duration_minutes: i64,

    /// e.g. "1 h 05 min"
    pub duration: String,

    /// Track the rider should go to
    pub track: Option<String>,

    pub cancelled: bool,

    pub delayed: bool,

    /// Whether the rider has favorited this train
    pub highlighted: bool,

    /// Set when a favorited train's track moved since it was favorited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_changed: Option<bool>,
}

impl JourneyResult {
    pub fn from_journey(
        journey: &Journey,
        favorite: Option<&FavoriteTrainData>,
        now: DateTime<Utc>,
    ) -> Self {
        let departure = journey.departure.effective_time();
        let duration = journey.duration();

        Self {
            train_number: journey.train_number().to_string(),
            line_id: journey.run.commuter_line_id.clone(),
            journey_key: journey.key.to_string(),
            scheduled_departure: journey.departure.scheduled_time,
            departure,
            scheduled_arrival: journey.arrival.scheduled_time,
            arrival: journey.arrival.effective_time(),
            minutes_until_departure: minutes_until(now, departure),
            duration_minutes: duration.num_minutes(),
            duration: format_duration(duration),
            track: journey.track.as_ref().map(|info| info.track.clone()),
            cancelled: journey.is_cancelled(),
            delayed: journey.departure.is_delayed(),
            highlighted: favorite.is_some_and(|f| f.highlighted),
            track_changed: favorite
                .filter(|f| f.refers_to(&journey.key))
                .and_then(|f| f.track_changed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrainsResponse {
    pub origin: String,
    pub destination: String,
    pub journeys: Vec<JourneyResult>,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: HashMap<String, FavoriteTrainData>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

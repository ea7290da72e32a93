//! Digitraffic rail GraphQL client.
//!
//! Provides async methods for the station list and live trains at a
//! station. Handles the required user header, HTTP status mapping and
//! GraphQL error envelopes, then converts responses to domain types.

use std::collections::HashSet;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::domain::{Station, StationCode, TrainRun};

use super::convert::{convert_stations, convert_trains};
use super::error::FeedError;
use super::types::{GraphQlResponse, StationsData, TrainsData};

/// Default GraphQL endpoint.
const DEFAULT_BASE_URL: &str = "https://rata.digitraffic.fi/api/v2/graphql/graphql";

/// Default number of upcoming departures to request per station.
const DEFAULT_DEPARTING_TRAINS: u16 = 100;

const STATIONS_QUERY: &str = r#"
{
  stations(where: {passengerTraffic: {equals: true}}) {
    name
    shortCode
    location
  }
}
"#;

const TRAINS_QUERY: &str = r#"
query Trains($station: String!, $departing: Int!) {
  trainsByStationAndQuantity(
    station: $station
    departingTrains: $departing
    departedTrains: 0
    arrivingTrains: 0
    arrivedTrains: 0
    includeNonStopping: false
  ) {
    trainNumber
    commuterLineid
    cancelled
    trainType {
      name
      trainCategory {
        name
      }
    }
    timeTableRows {
      type
      scheduledTime
      liveEstimateTime
      actualTime
      differenceInMinutes
      commercialTrack
      cancelled
      commercialStop
      trainStopping
      station {
        shortCode
      }
    }
  }
}
"#;

/// Configuration for the Digitraffic client.
#[derive(Debug, Clone)]
pub struct DigitrafficConfig {
    /// Value of the `Digitraffic-User` header identifying this application
    pub user: String,
    /// GraphQL endpoint URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Station codes to leave out of the station list
    pub excluded_stations: Vec<String>,
    /// Upcoming departures to request per station
    pub departing_trains: u16,
}

impl DigitrafficConfig {
    /// Create a new config with the given user identifier.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            excluded_stations: Vec::new(),
            departing_trains: DEFAULT_DEPARTING_TRAINS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set station codes to exclude from the station list.
    pub fn with_excluded_stations(mut self, codes: Vec<String>) -> Self {
        self.excluded_stations = codes;
        self
    }

    /// Set how many departures to request per station.
    pub fn with_departing_trains(mut self, n: u16) -> Self {
        self.departing_trains = n;
        self
    }
}

/// Digitraffic rail API client.
#[derive(Debug, Clone)]
pub struct DigitrafficClient {
    http: reqwest::Client,
    base_url: String,
    excluded_stations: HashSet<String>,
    departing_trains: u16,
}

impl DigitrafficClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DigitrafficConfig) -> Result<Self, FeedError> {
        let mut headers = HeaderMap::new();

        let user = HeaderValue::from_str(&config.user).map_err(|_| FeedError::Api {
            status: 0,
            message: "Invalid Digitraffic-User header value".to_string(),
        })?;
        headers.insert(HeaderName::from_static("digitraffic-user"), user);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            excluded_stations: config.excluded_stations.into_iter().collect(),
            departing_trains: config.departing_trains,
        })
    }

    /// Fetch passenger stations, minus the configured exclusions.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, FeedError> {
        let data: StationsData = self.query(STATIONS_QUERY, json!({})).await?;
        let dtos = data.stations.ok_or(FeedError::MissingData)?;

        let stations: Vec<Station> = convert_stations(&dtos)
            .into_iter()
            .filter(|s| !self.excluded_stations.contains(s.short_code.as_str()))
            .collect();

        debug!(count = stations.len(), "fetched stations");
        Ok(stations)
    }

    /// Fetch upcoming trains departing `station`, with full timetables.
    pub async fn fetch_trains(&self, station: &StationCode) -> Result<Vec<TrainRun>, FeedError> {
        let variables = json!({
            "station": station.as_str(),
            "departing": self.departing_trains,
        });
        let data: TrainsData = self.query(TRAINS_QUERY, variables).await?;
        let dtos = data
            .trains_by_station_and_quantity
            .ok_or(FeedError::MissingData)?;

        let runs = convert_trains(&dtos);
        debug!(%station, count = runs.len(), "fetched trains");
        Ok(runs)
    }

    /// POST a GraphQL query and unwrap the envelope.
    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, FeedError> {
        let response = self
            .http
            .post(&self.base_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_envelope(&body)
    }
}

/// Decode a GraphQL response body into its `data`.
///
/// Errors in the envelope win over any partial data.
pub(super) fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, FeedError> {
    let envelope: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| FeedError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

    if !envelope.errors.is_empty() {
        return Err(FeedError::GraphQl {
            messages: envelope.errors.into_iter().map(|e| e.message).collect(),
        });
    }

    envelope.data.ok_or(FeedError::MissingData)
}

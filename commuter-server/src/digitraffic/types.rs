//! Digitraffic GraphQL response DTOs.
//!
//! These map directly to the JSON the rail GraphQL endpoint returns. Most
//! fields are optional because the feed omits or nulls them freely, e.g.
//! `commuterLineid` is null for long-distance trains.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One entry of the GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// `data` of the stations query.
#[derive(Debug, Clone, Deserialize)]
pub struct StationsData {
    pub stations: Option<Vec<StationDto>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub name: String,
    pub short_code: String,
    /// `[longitude, latitude]`.
    pub location: Option<Vec<f64>>,
}

/// `data` of the trains query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainsData {
    pub trains_by_station_and_quantity: Option<Vec<TrainDto>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDto {
    pub train_number: TrainNumber,
    pub commuter_lineid: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    pub train_type: Option<TrainTypeDto>,
    #[serde(default)]
    pub time_table_rows: Vec<TimeTableRowDto>,
}

/// Train numbers are integers in GraphQL but strings in the REST API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TrainNumber {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for TrainNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainNumber::Number(n) => write!(f, "{n}"),
            TrainNumber::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainTypeDto {
    pub name: String,
    pub train_category: Option<NamedDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedDto {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTableRowDto {
    /// "ARRIVAL" or "DEPARTURE".
    #[serde(rename = "type")]
    pub row_type: String,
    pub scheduled_time: DateTime<Utc>,
    pub live_estimate_time: Option<DateTime<Utc>>,
    pub actual_time: Option<DateTime<Utc>>,
    pub difference_in_minutes: Option<i32>,
    pub commercial_track: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    pub commercial_stop: Option<bool>,
    #[serde(default)]
    pub train_stopping: bool,
    pub station: StationRefDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRefDto {
    pub short_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trains_response() {
        let json = r#"{
            "data": {
                "trainsByStationAndQuantity": [{
                    "trainNumber": 8765,
                    "commuterLineid": "I",
                    "cancelled": false,
                    "trainType": {"name": "HL", "trainCategory": {"name": "Commuter"}},
                    "timeTableRows": [{
                        "type": "DEPARTURE",
                        "scheduledTime": "2024-03-15T08:00:00.000Z",
                        "liveEstimateTime": "2024-03-15T08:01:00.000Z",
                        "actualTime": null,
                        "differenceInMinutes": 1,
                        "commercialTrack": "4",
                        "cancelled": false,
                        "commercialStop": true,
                        "trainStopping": true,
                        "station": {"shortCode": "HKI"}
                    }]
                }]
            }
        }"#;

        let response: GraphQlResponse<TrainsData> = serde_json::from_str(json).unwrap();
        assert!(response.errors.is_empty());
        let trains = response.data.unwrap().trains_by_station_and_quantity.unwrap();
        assert_eq!(trains.len(), 1);
        assert_eq!(trains[0].train_number, TrainNumber::Number(8765));
        assert_eq!(trains[0].commuter_lineid.as_deref(), Some("I"));
        let row = &trains[0].time_table_rows[0];
        assert_eq!(row.row_type, "DEPARTURE");
        assert_eq!(row.difference_in_minutes, Some(1));
        assert!(row.actual_time.is_none());
        assert_eq!(row.station.short_code, "HKI");
    }

    #[test]
    fn parse_errors_without_data() {
        let json = r#"{"errors": [{"message": "Unknown field"}], "data": null}"#;
        let response: GraphQlResponse<StationsData> = serde_json::from_str(json).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Unknown field");
    }

    #[test]
    fn parse_station_with_location() {
        let json = r#"{"name": "Pasila asema", "shortCode": "PSL", "location": [24.933, 60.199]}"#;
        let station: StationDto = serde_json::from_str(json).unwrap();
        assert_eq!(station.short_code, "PSL");
        assert_eq!(station.location, Some(vec![24.933, 60.199]));
    }

    #[test]
    fn train_number_as_text() {
        let n: TrainNumber = serde_json::from_str("\"123\"").unwrap();
        assert_eq!(n.to_string(), "123");
        let n: TrainNumber = serde_json::from_str("123").unwrap();
        assert_eq!(n.to_string(), "123");
    }
}

//! Train runs and their timetable rows.
//!
//! A `TrainRun` is one day's service for a train number, with the full
//! stopping pattern as an ordered list of `TimetableRow`s. Each stop
//! normally contributes an ARRIVAL row followed by a DEPARTURE row.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StationCode;

/// Train category of commuter services.
pub const COMMUTER_CATEGORY: &str = "Commuter";

/// Whether a row records the train arriving at or leaving a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowType {
    Arrival,
    Departure,
}

/// One stop event of a train run at one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRow {
    pub station_short_code: StationCode,
    #[serde(rename = "type")]
    pub row_type: RowType,
    pub scheduled_time: DateTime<Utc>,
    pub live_estimate_time: Option<DateTime<Utc>>,
    pub actual_time: Option<DateTime<Utc>>,
    /// Signed minutes relative to the schedule.
    pub difference_in_minutes: Option<i32>,
    pub commercial_track: String,
    pub cancelled: bool,
    pub commercial_stop: bool,
    pub train_stopping: bool,
}

impl TimetableRow {
    /// Creates a stopping, non-cancelled row with no realtime data.
    pub fn new(
        station: StationCode,
        row_type: RowType,
        scheduled_time: DateTime<Utc>,
        track: impl Into<String>,
    ) -> Self {
        Self {
            station_short_code: station,
            row_type,
            scheduled_time,
            live_estimate_time: None,
            actual_time: None,
            difference_in_minutes: None,
            commercial_track: track.into(),
            cancelled: false,
            commercial_stop: true,
            train_stopping: true,
        }
    }

    /// Live estimate if the feed has one, otherwise the scheduled time.
    pub fn effective_time(&self) -> DateTime<Utc> {
        self.live_estimate_time.unwrap_or(self.scheduled_time)
    }

    pub fn is_departure_from(&self, station: &str) -> bool {
        self.row_type == RowType::Departure && self.station_short_code == *station
    }

    pub fn is_arrival_at(&self, station: &str) -> bool {
        self.row_type == RowType::Arrival && self.station_short_code == *station
    }

    /// Whether the departure is running late by at least a minute.
    pub fn is_delayed(&self) -> bool {
        self.difference_in_minutes.is_some_and(|d| d > 0)
    }
}

/// One scheduled service of a train number on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRun {
    /// Numeric string, unique within a service day.
    pub train_number: String,
    /// Service pattern code, e.g. "I", "P", "S".
    pub train_type: String,
    pub train_category: String,
    /// Rider-facing line letter, e.g. "I" or "K".
    #[serde(rename = "commuterLineID")]
    pub commuter_line_id: String,
    pub cancelled: bool,
    /// Rows in increasing scheduled time order, as given by the feed.
    pub time_table_rows: Vec<TimetableRow>,
}

impl TrainRun {
    pub fn is_commuter(&self) -> bool {
        self.train_category == COMMUTER_CATEGORY
    }

    /// Ring-line services ("I"/"P") that pass Helsinki/Pasila twice in one run.
    ///
    /// The live feed reports commuter trains with type "HL" and carries the
    /// ring letter in the line id, so both fields are checked.
    pub fn is_loop_type(&self) -> bool {
        let is_ring = |s: &str| matches!(s, "I" | "P");
        is_ring(&self.train_type) || is_ring(&self.commuter_line_id)
    }

    /// Returns a copy of this run with its rows replaced.
    pub fn with_rows(&self, rows: Vec<TimetableRow>) -> Self {
        Self {
            train_number: self.train_number.clone(),
            train_type: self.train_type.clone(),
            train_category: self.train_category.clone(),
            commuter_line_id: self.commuter_line_id.clone(),
            cancelled: self.cancelled,
            time_table_rows: rows,
        }
    }

    /// Index of the first row at `station`, of either type.
    pub fn first_row_at(&self, station: &str) -> Option<usize> {
        self.time_table_rows
            .iter()
            .position(|row| row.station_short_code == *station)
    }

    /// First DEPARTURE row from `station`.
    pub fn first_departure_from(&self, station: &str) -> Option<&TimetableRow> {
        self.time_table_rows
            .iter()
            .find(|row| row.is_departure_from(station))
    }
}

/// Identity of one leg of a run: `{train}-{origin}-{destination}`.
///
/// Loop services can visit the same station pair twice, so the train number
/// alone does not identify which visit a favorite refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyKey(String);

impl JourneyKey {
    pub fn new(train_number: &str, origin: &str, destination: &str) -> Self {
        Self(format!("{train_number}-{origin}-{destination}"))
    }

    /// Wraps a stored key verbatim.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JourneyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Track and time of the departure that applies to a leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub track: String,
    pub timestamp: DateTime<Utc>,
    pub journey_key: JourneyKey,
}

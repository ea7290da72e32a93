//! Rider-facing view of a resolved leg.

use chrono::Duration;

use crate::domain::{JourneyKey, StationCode, TimetableRow, TrackInfo, TrainRun, journey_duration};

use super::filter::{filter_and_slice, leg_rows};
use super::track::resolve_track_info;

/// One departure from origin to destination, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    /// The run, trimmed to start at the origin.
    pub run: TrainRun,
    /// Origin departure row of the leg.
    pub departure: TimetableRow,
    /// First destination arrival after `departure`.
    pub arrival: TimetableRow,
    pub track: Option<TrackInfo>,
    pub key: JourneyKey,
}

impl Journey {
    /// Builds the view for a run that has already passed validation.
    ///
    /// Returns `None` if the run has no leg between the two stations.
    pub fn from_run(
        run: TrainRun,
        origin: &StationCode,
        destination: &StationCode,
    ) -> Option<Self> {
        let (dep, arr) = leg_rows(&run, origin.as_str(), destination.as_str())?;
        let departure = run.time_table_rows[dep].clone();
        let arrival = run.time_table_rows[arr].clone();
        let track = resolve_track_info(&run, origin, destination);
        let key = JourneyKey::new(&run.train_number, origin.as_str(), destination.as_str());

        Some(Self {
            run,
            departure,
            arrival,
            track,
            key,
        })
    }

    /// Travel time between the effective departure and arrival.
    pub fn duration(&self) -> Duration {
        journey_duration(self.departure.effective_time(), self.arrival.effective_time())
    }

    pub fn train_number(&self) -> &str {
        &self.run.train_number
    }

    /// Cancelled if the run or either end of the leg is.
    pub fn is_cancelled(&self) -> bool {
        self.run.cancelled || self.departure.cancelled || self.arrival.cancelled
    }
}

/// Filters, slices and orders `runs`, then builds a view per leg.
pub fn resolve_journeys(
    runs: &[TrainRun],
    origin: &StationCode,
    destination: &StationCode,
) -> Vec<Journey> {
    filter_and_slice(runs, origin, destination)
        .into_iter()
        .filter_map(|run| Journey::from_run(run, origin, destination))
        .collect()
}

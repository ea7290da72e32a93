//! Track resolution for a leg of a run.

use crate::domain::{
    JourneyKey, RowType, StationCode, TimetableRow, TrackInfo, TrainRun, is_loop_hub,
};

/// Finds the departure row whose track and time apply to a leg from
/// `station` towards `destination`.
///
/// Ring-line trains ("I"/"P") leave Helsinki and Pasila twice per run, and
/// the later departure supersedes the earlier one for track purposes. Other
/// train types report their first departure from `station`.
///
/// Returns `None` when the run never departs `station`. Pass runs already
/// trimmed by [`filter_and_slice`](super::filter_and_slice) so both
/// functions see the same rows.
pub fn resolve_track_info(
    run: &TrainRun,
    station: &StationCode,
    destination: &StationCode,
) -> Option<TrackInfo> {
    let rows = &run.time_table_rows;
    let departures: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.is_departure_from(station.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    let first = *departures.first()?;
    let last = *departures.last()?;

    let chosen = if !run.is_loop_type() {
        first
    } else if station.is_loop_hub() {
        return_leg_departure(rows, &departures).unwrap_or(last)
    } else {
        last
    };

    let row = &rows[chosen];
    Some(TrackInfo {
        track: row.commercial_track.clone(),
        timestamp: row.scheduled_time,
        journey_key: JourneyKey::new(&run.train_number, station.as_str(), destination.as_str()),
    })
}

/// Last departure after which the train still comes back through a hub.
///
/// The final departure always counts, so a run that never returns through
/// a hub resolves to its last departure.
fn return_leg_departure(rows: &[TimetableRow], departures: &[usize]) -> Option<usize> {
    let last = *departures.last()?;
    departures
        .iter()
        .copied()
        .filter(|&idx| idx == last || returns_through_hub(&rows[idx + 1..]))
        .last()
}

fn returns_through_hub(rows: &[TimetableRow]) -> bool {
    rows.iter()
        .any(|row| row.row_type == RowType::Arrival && is_loop_hub(row.station_short_code.as_str()))
}

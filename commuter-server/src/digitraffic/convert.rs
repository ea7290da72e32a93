//! Conversion from Digitraffic DTOs to domain types.

use tracing::warn;

use crate::domain::{Coordinate, RowType, Station, StationCode, TimetableRow, TrainRun};

use super::types::{StationDto, TimeTableRowDto, TrainDto};

/// Error converting a feed record into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid station code {0:?}")]
    InvalidStation(String),

    #[error("unknown timetable row type {0:?}")]
    UnknownRowType(String),
}

pub fn convert_station(dto: &StationDto) -> Result<Station, ConversionError> {
    let short_code = StationCode::parse(&dto.short_code)
        .map_err(|_| ConversionError::InvalidStation(dto.short_code.clone()))?;

    let location = match dto.location.as_deref() {
        Some([longitude, latitude, ..]) => Some(Coordinate::new(*latitude, *longitude)),
        _ => None,
    };

    Ok(Station {
        name: dto.name.clone(),
        short_code,
        location,
    })
}

fn convert_row(dto: &TimeTableRowDto) -> Result<TimetableRow, ConversionError> {
    let row_type = match dto.row_type.as_str() {
        "ARRIVAL" => RowType::Arrival,
        "DEPARTURE" => RowType::Departure,
        other => return Err(ConversionError::UnknownRowType(other.to_string())),
    };

    let station = StationCode::parse(&dto.station.short_code)
        .map_err(|_| ConversionError::InvalidStation(dto.station.short_code.clone()))?;

    Ok(TimetableRow {
        station_short_code: station,
        row_type,
        scheduled_time: dto.scheduled_time,
        live_estimate_time: dto.live_estimate_time,
        actual_time: dto.actual_time,
        difference_in_minutes: dto.difference_in_minutes,
        commercial_track: dto.commercial_track.clone().unwrap_or_default(),
        cancelled: dto.cancelled,
        commercial_stop: dto.commercial_stop.unwrap_or(false),
        train_stopping: dto.train_stopping,
    })
}

pub fn convert_train(dto: &TrainDto) -> Result<TrainRun, ConversionError> {
    let rows = dto
        .time_table_rows
        .iter()
        .map(convert_row)
        .collect::<Result<Vec<_>, _>>()?;

    let (train_type, train_category) = match &dto.train_type {
        Some(t) => (
            t.name.clone(),
            t.train_category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    Ok(TrainRun {
        train_number: dto.train_number.to_string(),
        train_type,
        train_category,
        commuter_line_id: dto.commuter_lineid.clone().unwrap_or_default(),
        cancelled: dto.cancelled,
        time_table_rows: rows,
    })
}

/// Converts every train, skipping (and logging) ones the feed garbled.
///
/// A run with one bad row is dropped whole; a partial stopping pattern
/// would mislead the journey checks.
pub fn convert_trains(dtos: &[TrainDto]) -> Vec<TrainRun> {
    dtos.iter()
        .filter_map(|dto| match convert_train(dto) {
            Ok(run) => Some(run),
            Err(e) => {
                warn!(train = %dto.train_number, error = %e, "skipping malformed train");
                None
            }
        })
        .collect()
}

/// Converts stations, skipping codes that fail validation.
pub fn convert_stations(dtos: &[StationDto]) -> Vec<Station> {
    dtos.iter()
        .filter_map(|dto| match convert_station(dto) {
            Ok(station) => Some(station),
            Err(e) => {
                warn!(station = %dto.name, error = %e, "skipping malformed station");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digitraffic::types::{NamedDto, StationRefDto, TrainNumber, TrainTypeDto};
    use chrono::{TimeZone, Utc};

    fn row(code: &str, row_type: &str) -> TimeTableRowDto {
        TimeTableRowDto {
            row_type: row_type.to_string(),
            scheduled_time: Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap(),
            live_estimate_time: None,
            actual_time: None,
            difference_in_minutes: None,
            commercial_track: Some("3".into()),
            cancelled: false,
            commercial_stop: Some(true),
            train_stopping: true,
            station: StationRefDto {
                short_code: code.to_string(),
            },
        }
    }

    fn train(rows: Vec<TimeTableRowDto>) -> TrainDto {
        TrainDto {
            train_number: TrainNumber::Number(8765),
            commuter_lineid: Some("I".into()),
            cancelled: false,
            train_type: Some(TrainTypeDto {
                name: "HL".into(),
                train_category: Some(NamedDto {
                    name: "Commuter".into(),
                }),
            }),
            time_table_rows: rows,
        }
    }

    #[test]
    fn converts_train() {
        let rows = vec![row("HKI", "DEPARTURE"), row("PSL", "ARRIVAL")];
        let run = convert_train(&train(rows)).unwrap();
        assert_eq!(run.train_number, "8765");
        assert_eq!(run.train_type, "HL");
        assert!(run.is_commuter());
        assert_eq!(run.commuter_line_id, "I");
        assert_eq!(run.time_table_rows.len(), 2);
        assert_eq!(run.time_table_rows[0].row_type, RowType::Departure);
        assert_eq!(run.time_table_rows[1].station_short_code, *"PSL");
        assert_eq!(run.time_table_rows[1].commercial_track, "3");
    }

    #[test]
    fn missing_track_and_line_become_empty() {
        let mut r = row("HKI", "DEPARTURE");
        r.commercial_track = None;
        let mut dto = train(vec![r]);
        dto.commuter_lineid = None;
        dto.train_type = None;

        let run = convert_train(&dto).unwrap();
        assert_eq!(run.time_table_rows[0].commercial_track, "");
        assert_eq!(run.commuter_line_id, "");
        assert!(!run.is_commuter());
    }

    #[test]
    fn unknown_row_type_is_rejected() {
        let err = convert_train(&train(vec![row("HKI", "PASS")])).unwrap_err();
        assert_eq!(err, ConversionError::UnknownRowType("PASS".into()));
    }

    #[test]
    fn convert_trains_skips_bad_runs() {
        let good = train(vec![row("HKI", "DEPARTURE")]);
        let bad = train(vec![row("hki", "DEPARTURE")]);
        let runs = convert_trains(&[good, bad]);
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn station_location_is_lon_lat() {
        let dto = StationDto {
            name: "Pasila asema".into(),
            short_code: "PSL".into(),
            location: Some(vec![24.933, 60.199]),
        };
        let station = convert_station(&dto).unwrap();
        let location = station.location.unwrap();
        assert_eq!(location.latitude, 60.199);
        assert_eq!(location.longitude, 24.933);
    }

    #[test]
    fn station_without_location() {
        let dto = StationDto {
            name: "Kerava asema".into(),
            short_code: "KE".into(),
            location: Some(vec![]),
        };
        assert!(convert_station(&dto).unwrap().location.is_none());
    }

    #[test]
    fn convert_stations_skips_invalid_codes() {
        let dtos = vec![
            StationDto {
                name: "Helsinki asema".into(),
                short_code: "HKI".into(),
                location: None,
            },
            StationDto {
                name: "Broken".into(),
                short_code: "x1".into(),
                location: None,
            },
        ];
        let stations = convert_stations(&dtos);
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].short_code, *"HKI");
    }
}

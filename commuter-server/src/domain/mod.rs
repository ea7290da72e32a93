//! Domain types for commuter departures.
//!
//! Stations, train runs and their timetable rows, plus the time and geo
//! helpers the rest of the crate builds on. Station codes are validated at
//! construction, so code that receives a `StationCode` can trust it.

mod geo;
mod station;
mod time;
mod train;

pub use geo::{BoundingBox, Coordinate, FINLAND};
pub use station::{HELSINKI, InvalidStationCode, PASILA, Station, StationCode};
pub use time::{FAVORITE_GRACE, format_duration, journey_duration, minutes_until, remove_after};
pub use train::{COMMUTER_CATEGORY, JourneyKey, RowType, TimetableRow, TrackInfo, TrainRun};

pub(crate) use station::is_loop_hub;

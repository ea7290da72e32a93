//! Journey resolution.
//!
//! Turns the raw runs the feed returns for an origin station into the
//! ordered departures that actually take a rider to the destination, and
//! works out which track applies for ring-line trains that pass Helsinki
//! and Pasila twice.
//!
//! Everything here is synchronous and pure: functions borrow their input
//! and return new values, so they can be called repeatedly or from several
//! tasks at once.

mod filter;
mod summary;
mod track;

pub use filter::{
    collapse_pasila_to_helsinki, departure_time, filter_and_slice, is_valid_journey, leg_rows,
};
pub use summary::{Journey, resolve_journeys};
pub use track::resolve_track_info;

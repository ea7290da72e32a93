//! Digitraffic rail feed client.
//!
//! Fintraffic's Digitraffic service publishes live Finnish rail data. This
//! module talks to its GraphQL endpoint for two things:
//! - the passenger station list, and
//! - upcoming trains at a station, each with its full timetable rows.
//!
//! The public API is free but rate-limited and occasionally flaky, so
//! callers should go through [`crate::departures::Departures`], which
//! caches responses and falls back to stale data on failure.

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{DigitrafficClient, DigitrafficConfig};
pub use convert::{ConversionError, convert_station, convert_train};
pub use error::FeedError;
pub use mock::FixtureFeed;
pub use types::{GraphQlResponse, StationDto, StationsData, TimeTableRowDto, TrainDto, TrainsData};

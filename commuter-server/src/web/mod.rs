//! Web layer for the commuter departures server.
//!
//! JSON endpoints for stations, departures between two stations and the
//! rider's favorite trains.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, Favorites};

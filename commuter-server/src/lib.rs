//! Commuter departures server.
//!
//! Answers "which commuter train gets me from here to there next, and
//! from which track?" for Helsinki-area rail, using live data from
//! Digitraffic, and remembers the trains a rider has favorited.

pub mod cache;
pub mod config;
pub mod departures;
pub mod digitraffic;
pub mod domain;
pub mod favorites;
pub mod journey;
pub mod web;

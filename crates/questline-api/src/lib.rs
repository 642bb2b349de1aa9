//! Questline HTTP API.
//!
//! Library half of the API binary, so route tests can build the same
//! router `main` serves.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

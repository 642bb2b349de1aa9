//! Fixed instants and coordinates shared by tests.

use chrono::{DateTime, TimeZone, Utc};
use questline_core::geo::GeoCoordinate;

/// The instant every deterministic test clock starts from.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Red Square, Moscow.
#[must_use]
pub fn moscow() -> GeoCoordinate {
    point(55.7558, 37.6176)
}

/// Builds a coordinate from literals known to be in range.
///
/// # Panics
///
/// Panics if the literals are out of range.
#[must_use]
pub fn point(latitude: f64, longitude: f64) -> GeoCoordinate {
    GeoCoordinate::new(latitude, longitude).expect("fixture coordinate must be valid")
}

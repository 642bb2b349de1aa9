//! Geographic value objects and the two-phase radius filter.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude used to size the prefilter box.
/// Slightly below the true ~111.19 km, which keeps the box conservative.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for GeoCoordinate {
    type Error = DomainError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl GeoCoordinate {
    /// Creates a coordinate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming `latitude` or `longitude`
    /// when a value is outside its range or not a number.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::validation(
                "latitude",
                format!("must be within [-90, 90], got {latitude}"),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::validation(
                "longitude",
                format!("must be within [-180, 180], got {longitude}"),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle (haversine) distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &GeoCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

/// An inclusive latitude/longitude box. When `min_longitude` is greater
/// than `max_longitude` the box wraps across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Smallest box (at the 111 km/degree approximation) containing every
    /// point within `radius_km` of `center`.
    ///
    /// Longitude is widened by the exact extent of a spherical cap at the
    /// center's latitude. When the cap reaches a pole the box spans every
    /// longitude.
    #[must_use]
    pub fn around(center: &GeoCoordinate, radius_km: f64) -> Self {
        let radius_deg = radius_km / KM_PER_DEGREE;
        let min_latitude = center.latitude - radius_deg;
        let max_latitude = center.latitude + radius_deg;

        if min_latitude <= -90.0 || max_latitude >= 90.0 {
            return Self {
                min_latitude: min_latitude.max(-90.0),
                max_latitude: max_latitude.min(90.0),
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        let ratio = radius_deg.to_radians().sin() / center.latitude.to_radians().cos();
        let lon_delta = if ratio >= 1.0 {
            180.0
        } else {
            ratio.asin().to_degrees()
        };
        if lon_delta >= 180.0 {
            return Self {
                min_latitude,
                max_latitude,
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        let mut min_longitude = center.longitude - lon_delta;
        let mut max_longitude = center.longitude + lon_delta;
        if min_longitude < -180.0 {
            min_longitude += 360.0;
        }
        if max_longitude > 180.0 {
            max_longitude -= 360.0;
        }

        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// Whether the box crosses the antimeridian.
    #[must_use]
    pub fn wraps_antimeridian(&self) -> bool {
        self.min_longitude > self.max_longitude
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, point: &GeoCoordinate) -> bool {
        let lat_ok = (self.min_latitude..=self.max_latitude).contains(&point.latitude);
        let lon_ok = if self.wraps_antimeridian() {
            point.longitude >= self.min_longitude || point.longitude <= self.max_longitude
        } else {
            (self.min_longitude..=self.max_longitude).contains(&point.longitude)
        };
        lat_ok && lon_ok
    }
}

/// A circular search area: the cheap box prefilter plus the exact
/// great-circle check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFence {
    center: GeoCoordinate,
    radius_km: f64,
    bounds: BoundingBox,
}

impl GeoFence {
    /// Creates a fence of `radius_km` around `center`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` on a negative or non-finite radius.
    pub fn new(center: GeoCoordinate, radius_km: f64) -> Result<Self, DomainError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(DomainError::validation(
                "radius_km",
                format!("must be a non-negative number, got {radius_km}"),
            ));
        }
        Ok(Self {
            center,
            radius_km,
            bounds: BoundingBox::around(&center, radius_km),
        })
    }

    /// The search center.
    #[must_use]
    pub fn center(&self) -> &GeoCoordinate {
        &self.center
    }

    /// The search radius.
    #[must_use]
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// The prefilter box.
    #[must_use]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Phase 1: whether `point` survives the box prefilter.
    #[must_use]
    pub fn may_contain(&self, point: &GeoCoordinate) -> bool {
        self.bounds.contains(point)
    }

    /// Phase 2: whether `point` is within the radius.
    #[must_use]
    pub fn contains(&self, point: &GeoCoordinate) -> bool {
        self.center.distance_km(point) <= self.radius_km
    }
}

//! Query handlers for the Location context.

use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use questline_core::geo::{GeoCoordinate, GeoFence};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Location;
use crate::domain::repository::LocationUnitOfWork;

/// Read-only view of a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    /// The location identifier.
    pub location_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Where the location is.
    pub coordinate: GeoCoordinate,
    /// Postal address, if known.
    pub address: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

impl From<Location> for LocationView {
    fn from(location: Location) -> Self {
        let record = location.record().clone();
        Self {
            location_id: record.id,
            name: record.name,
            description: record.description,
            coordinate: record.coordinate,
            address: record.address,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Retrieves a location by id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the location does not exist,
/// or the storage error that aborted the read.
pub async fn get_location_by_id<U>(
    location_id: Uuid,
    uow: &mut U,
) -> Result<LocationView, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    let location = uow.location_repository().get_by_id(location_id).await?;
    Ok(location.into())
}

/// Lists every location.
///
/// # Errors
///
/// Returns the storage error that aborted the read.
pub async fn list_locations<U>(uow: &mut U) -> Result<Vec<LocationView>, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    let locations = uow.location_repository().find_all().await?;
    Ok(locations.into_iter().map(LocationView::from).collect())
}

/// Lists locations within `radius_km` of `center`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a negative or non-finite radius,
/// or the storage error that aborted the read.
pub async fn search_locations_by_radius<U>(
    center: GeoCoordinate,
    radius_km: f64,
    uow: &mut U,
) -> Result<Vec<LocationView>, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    let fence = GeoFence::new(center, radius_km)?;
    let locations = uow.location_repository().find_by_location(&fence).await?;
    Ok(locations.into_iter().map(LocationView::from).collect())
}

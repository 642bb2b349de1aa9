//! Persistence ports for locations.

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::geo::GeoFence;
use questline_core::unit_of_work::Tracker;
use uuid::Uuid;

use super::aggregates::Location;

/// Repository for location aggregates, bound to a tracker's transaction.
#[async_trait]
pub trait LocationRepository: Send {
    /// Inserts or replaces the location by id.
    async fn save(&mut self, location: &Location) -> Result<(), DomainError>;

    /// Loads a location.
    ///
    /// Returns `DomainError::AggregateNotFound` if it does not exist.
    async fn get_by_id(&mut self, location_id: Uuid) -> Result<Location, DomainError>;

    /// Locations within the fence: bounding-box prefilter, then exact
    /// distance.
    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Location>, DomainError>;

    /// Every location.
    async fn find_all(&mut self) -> Result<Vec<Location>, DomainError>;
}

/// A tracker that can hand out location repositories sharing its
/// transaction.
pub trait LocationUnitOfWork: Tracker {
    /// The location repository bound to this unit of work.
    fn location_repository(&mut self) -> Box<dyn LocationRepository + '_>;
}

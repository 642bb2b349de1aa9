//! Domain events for the Location context.

use questline_core::event::{DomainEvent, EventMetadata};
use questline_core::geo::GeoCoordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type name for `LocationCreated`.
pub const LOCATION_CREATED_EVENT_TYPE: &str = "location.location_created";
/// Event type name for `LocationUpdated`.
pub const LOCATION_UPDATED_EVENT_TYPE: &str = "location.location_updated";

/// Emitted when a location is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCreated {
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
}

/// Emitted when a location's details are replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdated {
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
}

/// Event payload variants for the Location context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationEventKind {
    /// A location has been registered.
    LocationCreated(LocationCreated),
    /// A location has been updated.
    LocationUpdated(LocationUpdated),
}

/// Domain event envelope for the Location context.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: LocationEventKind,
}

impl DomainEvent for LocationEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            LocationEventKind::LocationCreated(_) => LOCATION_CREATED_EVENT_TYPE,
            LocationEventKind::LocationUpdated(_) => LOCATION_UPDATED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.kind)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn aggregate_id(&self) -> Uuid {
        match &self.kind {
            LocationEventKind::LocationCreated(payload) => payload.location_id,
            LocationEventKind::LocationUpdated(payload) => payload.location_id,
        }
    }
}

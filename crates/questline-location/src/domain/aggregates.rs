//! Aggregate roots for the Location context.

use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::event::EventMetadata;
use questline_core::geo::{GeoCoordinate, GeoFence};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::{CreateLocation, UpdateLocation};
use super::events::{
    LOCATION_CREATED_EVENT_TYPE, LOCATION_UPDATED_EVENT_TYPE, LocationCreated, LocationEvent,
    LocationEventKind, LocationUpdated,
};

/// Persisted state of a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Location identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description, possibly empty.
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

/// The aggregate root for a location.
#[derive(Debug, Clone)]
pub struct Location {
    state: LocationRecord,
    uncommitted_events: Vec<LocationEvent>,
}

fn validate_details(name: &str, address: Option<&str>) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name", "must not be empty"));
    }
    if address.is_some_and(|address| address.trim().is_empty()) {
        return Err(DomainError::validation("address", "must not be blank when present"));
    }
    Ok(())
}

impl Location {
    /// Registers a location, producing a `LocationCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name or a blank address.
    pub fn create(command: &CreateLocation, clock: &dyn Clock) -> Result<Self, DomainError> {
        validate_details(&command.name, command.address.as_deref())?;

        let now = clock.now();
        let state = LocationRecord {
            id: Uuid::now_v7(),
            name: command.name.clone(),
            description: command.description.clone(),
            coordinate: command.coordinate,
            address: command.address.clone(),
            created_at: now,
            updated_at: now,
        };
        let event = LocationEvent {
            metadata: EventMetadata::new(LOCATION_CREATED_EVENT_TYPE, command.correlation_id, now),
            kind: LocationEventKind::LocationCreated(LocationCreated {
                location_id: state.id,
                name: state.name.clone(),
                description: state.description.clone(),
                coordinate: state.coordinate,
                address: state.address.clone(),
            }),
        };

        Ok(Self {
            state,
            uncommitted_events: vec![event],
        })
    }

    /// Rebuilds a location from persisted state. No events are pending.
    #[must_use]
    pub fn restore(record: LocationRecord) -> Self {
        Self {
            state: record,
            uncommitted_events: Vec::new(),
        }
    }

    /// Replaces the location's details, producing a `LocationUpdated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name or a blank
    /// address; the location is unchanged on error.
    pub fn update(&mut self, command: &UpdateLocation, clock: &dyn Clock) -> Result<(), DomainError> {
        validate_details(&command.name, command.address.as_deref())?;

        let now = clock.now();
        self.state.name.clone_from(&command.name);
        self.state.description.clone_from(&command.description);
        self.state.coordinate = command.coordinate;
        self.state.address.clone_from(&command.address);
        self.state.updated_at = now;

        self.uncommitted_events.push(LocationEvent {
            metadata: EventMetadata::new(LOCATION_UPDATED_EVENT_TYPE, command.correlation_id, now),
            kind: LocationEventKind::LocationUpdated(LocationUpdated {
                location_id: self.state.id,
                name: self.state.name.clone(),
                description: self.state.description.clone(),
                coordinate: self.state.coordinate,
                address: self.state.address.clone(),
            }),
        });
        Ok(())
    }

    /// Whether the coordinate passes the fence's bounding-box prefilter.
    #[must_use]
    pub fn may_be_within(&self, fence: &GeoFence) -> bool {
        fence.may_contain(&self.state.coordinate)
    }

    /// Whether the coordinate lies within the fence radius.
    #[must_use]
    pub fn is_within(&self, fence: &GeoFence) -> bool {
        fence.contains(&self.state.coordinate)
    }

    /// The persisted state.
    #[must_use]
    pub fn record(&self) -> &LocationRecord {
        &self.state
    }

    /// The location identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// Where the location is.
    #[must_use]
    pub fn coordinate(&self) -> GeoCoordinate {
        self.state.coordinate
    }
}

impl AggregateRoot for Location {
    type Event = LocationEvent;

    fn aggregate_id(&self) -> Uuid {
        self.state.id
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

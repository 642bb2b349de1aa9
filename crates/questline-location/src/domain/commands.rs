//! Commands for the Location context.

use questline_core::command::Command;
use questline_core::geo::GeoCoordinate;
use uuid::Uuid;

/// Command to register a new location.
#[derive(Debug, Clone)]
pub struct CreateLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Where the location is.
    pub coordinate: GeoCoordinate,
    /// Postal address, if known.
    pub address: Option<String>,
}

impl Command for CreateLocation {
    fn command_type(&self) -> &'static str {
        "location.create_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to replace the details of an existing location.
#[derive(Debug, Clone)]
pub struct UpdateLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
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

impl Command for UpdateLocation {
    fn command_type(&self) -> &'static str {
        "location.update_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

//! Route modules organized by bounded context.

pub mod health;
pub mod locations;
pub mod quests;

use axum::Router;
use questline_core::command::CommandOutcome;
use questline_core::error::DomainError;
use questline_core::geo::GeoCoordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The full router served by the binary, minus transport layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/quests", quests::router())
        .nest("/api/v1/locations", locations::router())
        .with_state(state)
}

/// A coordinate as sent by clients. Range checks happen in
/// [`GeoCoordinate::new`] so they surface as validation errors.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordinateBody {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
}

impl CoordinateBody {
    pub(crate) fn into_coordinate(self, field: &str) -> Result<GeoCoordinate, DomainError> {
        GeoCoordinate::new(self.latitude, self.longitude).map_err(|e| e.in_field(field))
    }
}

/// Query string for the radius search endpoints.
#[derive(Debug, Deserialize)]
pub struct RadiusQuery {
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Search radius in kilometres.
    pub radius_km: f64,
}

impl RadiusQuery {
    pub(crate) fn center(&self) -> Result<GeoCoordinate, DomainError> {
        GeoCoordinate::new(self.latitude, self.longitude)
    }
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate the command acted on.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        Self {
            aggregate_id: outcome.aggregate_id,
            event_ids: outcome.event_ids,
        }
    }
}

pub(crate) fn parse_id(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError(DomainError::validation(field, "must be a UUID")))
}

//! Routes for the Location bounded context.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use questline_location::application::command_handlers;
use questline_location::application::query_handlers::{self, LocationView};
use questline_location::domain::commands;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{CommandResponse, CoordinateBody, RadiusQuery, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST / and PUT /{location_id}.
#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Where the place is.
    pub coordinate: CoordinateBody,
    /// Postal address, if known.
    #[serde(default)]
    pub address: Option<String>,
}

/// POST /
#[instrument(skip(state, request), fields(name = %request.name))]
async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateLocation {
        correlation_id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        coordinate: request.coordinate.into_coordinate("coordinate")?,
        address: request.address,
    };

    info!(correlation_id = %command.correlation_id, "handling create_location command");

    let mut uow = state.unit_of_work();
    let outcome = command_handlers::handle_create_location(
        &command,
        state.clock.as_ref(),
        &mut *uow,
        &state.publisher,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// PUT /{location_id}
#[instrument(skip_all, fields(location_id = %location_id))]
async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateLocation {
        correlation_id: Uuid::new_v4(),
        location_id: parse_id("location_id", &location_id)?,
        name: request.name,
        description: request.description,
        coordinate: request.coordinate.into_coordinate("coordinate")?,
        address: request.address,
    };

    info!(correlation_id = %command.correlation_id, "handling update_location command");

    let mut uow = state.unit_of_work();
    let outcome = command_handlers::handle_update_location(
        &command,
        state.clock.as_ref(),
        &mut *uow,
        &state.publisher,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// GET /{location_id}
#[instrument(skip_all, fields(location_id = %location_id))]
async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<LocationView>, ApiError> {
    let location_id = parse_id("location_id", &location_id)?;
    let mut uow = state.unit_of_work();
    let view = query_handlers::get_location_by_id(location_id, &mut *uow).await?;
    Ok(Json(view))
}

/// GET /
#[instrument(skip_all)]
async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationView>>, ApiError> {
    let mut uow = state.unit_of_work();
    let views = query_handlers::list_locations(&mut *uow).await?;
    Ok(Json(views))
}

/// GET /search?latitude=&longitude=&radius_km=
#[instrument(skip_all, fields(latitude = query.latitude, longitude = query.longitude, radius_km = query.radius_km))]
async fn search_locations(
    State(state): State<AppState>,
    Query(query): Query<RadiusQuery>,
) -> Result<Json<Vec<LocationView>>, ApiError> {
    let center = query.center()?;
    let mut uow = state.unit_of_work();
    let views =
        query_handlers::search_locations_by_radius(center, query.radius_km, &mut *uow).await?;
    Ok(Json(views))
}

/// Returns the router for the location context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_location).get(list_locations))
        .route("/search", get(search_locations))
        .route("/{location_id}", get(get_location).put(update_location))
}

//! Routes for the Quest bounded context.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use questline_quest::application::command_handlers;
use questline_quest::application::query_handlers::{self, QuestView};
use questline_quest::domain::commands;
use questline_quest::domain::status::QuestStatus;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{CommandResponse, CoordinateBody, RadiusQuery, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateQuestRequest {
    /// Short title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// `easy`, `medium` or `hard`.
    pub difficulty: String,
    /// Reward points.
    pub reward: u32,
    /// Expected duration in minutes.
    pub duration_minutes: u32,
    /// Where the quest is aimed.
    pub target_location: CoordinateBody,
    /// Where the quest is carried out.
    pub execution_location: CoordinateBody,
    /// Equipment the assignee needs.
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Skills the assignee needs.
    #[serde(default)]
    pub skills: Vec<String>,
    /// User creating the quest.
    pub creator: String,
}

/// Request body for POST /{quest_id}/status.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    /// Target status, e.g. `posted`.
    pub status: String,
}

/// Request body for POST /{quest_id}/assign.
#[derive(Debug, Deserialize)]
pub struct AssignQuestRequest {
    /// User taking the quest.
    pub assignee: String,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListQuestsQuery {
    /// Only quests in this status.
    pub status: Option<String>,
}

/// POST /
#[instrument(skip(state, request), fields(creator = %request.creator))]
async fn create_quest(
    State(state): State<AppState>,
    Json(request): Json<CreateQuestRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateQuest {
        correlation_id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        difficulty: request.difficulty.parse()?,
        reward: request.reward,
        duration_minutes: request.duration_minutes,
        target_location: request.target_location.into_coordinate("target_location")?,
        execution_location: request
            .execution_location
            .into_coordinate("execution_location")?,
        equipment: request.equipment,
        skills: request.skills,
        creator: request.creator,
    };

    info!(correlation_id = %command.correlation_id, "handling create_quest command");

    let mut uow = state.unit_of_work();
    let outcome = command_handlers::handle_create_quest(
        &command,
        state.clock.as_ref(),
        &mut *uow,
        &state.publisher,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// POST /{quest_id}/status
#[instrument(skip_all, fields(quest_id = %quest_id, status = %request.status))]
async fn change_quest_status(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
    Json(request): Json<ChangeStatusRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ChangeQuestStatus {
        correlation_id: Uuid::new_v4(),
        quest_id: parse_id("quest_id", &quest_id)?,
        new_status: request.status.parse()?,
    };

    info!(correlation_id = %command.correlation_id, "handling change_quest_status command");

    let mut uow = state.unit_of_work();
    let outcome = command_handlers::handle_change_quest_status(
        &command,
        state.clock.as_ref(),
        &mut *uow,
        &state.publisher,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// POST /{quest_id}/assign
#[instrument(skip_all, fields(quest_id = %quest_id, assignee = %request.assignee))]
async fn assign_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
    Json(request): Json<AssignQuestRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AssignQuest {
        correlation_id: Uuid::new_v4(),
        quest_id: parse_id("quest_id", &quest_id)?,
        assignee: request.assignee,
    };

    info!(correlation_id = %command.correlation_id, "handling assign_quest command");

    let mut uow = state.unit_of_work();
    let outcome = command_handlers::handle_assign_quest(
        &command,
        state.clock.as_ref(),
        &mut *uow,
        &state.publisher,
    )
    .await?;

    Ok(Json(outcome.into()))
}

/// GET /{quest_id}
#[instrument(skip_all, fields(quest_id = %quest_id))]
async fn get_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> Result<Json<QuestView>, ApiError> {
    let quest_id = parse_id("quest_id", &quest_id)?;
    let mut uow = state.unit_of_work();
    let view = query_handlers::get_quest_by_id(quest_id, &mut *uow).await?;
    Ok(Json(view))
}

/// GET /?status=
#[instrument(skip_all, fields(status = ?query.status))]
async fn list_quests(
    State(state): State<AppState>,
    Query(query): Query<ListQuestsQuery>,
) -> Result<Json<Vec<QuestView>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<QuestStatus>)
        .transpose()?;
    let mut uow = state.unit_of_work();
    let views = query_handlers::list_quests(status, &mut *uow).await?;
    Ok(Json(views))
}

/// GET /search?latitude=&longitude=&radius_km=
#[instrument(skip_all, fields(latitude = query.latitude, longitude = query.longitude, radius_km = query.radius_km))]
async fn search_quests(
    State(state): State<AppState>,
    Query(query): Query<RadiusQuery>,
) -> Result<Json<Vec<QuestView>>, ApiError> {
    let center = query.center()?;
    let mut uow = state.unit_of_work();
    let views = query_handlers::search_quests_by_radius(center, query.radius_km, &mut *uow).await?;
    Ok(Json(views))
}

/// GET /assigned/{user_id}
#[instrument(skip_all, fields(user_id = %user_id))]
async fn list_assigned_quests(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<QuestView>>, ApiError> {
    let mut uow = state.unit_of_work();
    let views = query_handlers::list_assigned_quests(&user_id, &mut *uow).await?;
    Ok(Json(views))
}

/// Returns the router for the quest context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quest).get(list_quests))
        .route("/search", get(search_quests))
        .route("/assigned/{user_id}", get(list_assigned_quests))
        .route("/{quest_id}", get(get_quest))
        .route("/{quest_id}/status", post(change_quest_status))
        .route("/{quest_id}/assign", post(assign_quest))
}

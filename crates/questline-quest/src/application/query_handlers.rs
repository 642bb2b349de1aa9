//! Query handlers for the Quest context.
//!
//! Queries read through the unit of work without opening a transaction and
//! return serializable views.

use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use questline_core::geo::{GeoCoordinate, GeoFence};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Quest;
use crate::domain::repository::QuestUnitOfWork;
use crate::domain::status::{Difficulty, QuestStatus};

/// Read-only view of a quest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestView {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Reward points.
    pub reward: u32,
    /// Expected duration in minutes.
    pub duration_minutes: u32,
    /// Where the quest's objective is.
    pub target_location: GeoCoordinate,
    /// Where the quest is carried out.
    pub execution_location: GeoCoordinate,
    /// Required equipment.
    pub equipment: Vec<String>,
    /// Required skills.
    pub skills: Vec<String>,
    /// Current status.
    pub status: QuestStatus,
    /// Identity of the creator.
    pub creator: String,
    /// Identity of the assignee, once assigned.
    pub assignee: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

impl From<Quest> for QuestView {
    fn from(quest: Quest) -> Self {
        let record = quest.record().clone();
        Self {
            quest_id: record.id,
            title: record.title,
            description: record.description,
            difficulty: record.difficulty,
            reward: record.reward,
            duration_minutes: record.duration_minutes,
            target_location: record.target_location,
            execution_location: record.execution_location,
            equipment: record.equipment,
            skills: record.skills,
            status: record.status,
            creator: record.creator,
            assignee: record.assignee,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn views(quests: Vec<Quest>) -> Vec<QuestView> {
    quests.into_iter().map(QuestView::from).collect()
}

/// Retrieves a quest by id.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the quest does not exist, or
/// the storage error that aborted the read.
pub async fn get_quest_by_id<U>(quest_id: Uuid, uow: &mut U) -> Result<QuestView, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let quest = uow.quest_repository().get_by_id(quest_id).await?;
    Ok(quest.into())
}

/// Lists quests, optionally only those in `status`.
///
/// # Errors
///
/// Returns the storage error that aborted the read.
pub async fn list_quests<U>(
    status: Option<QuestStatus>,
    uow: &mut U,
) -> Result<Vec<QuestView>, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let mut repo = uow.quest_repository();
    let quests = match status {
        Some(status) => repo.find_by_status(status).await?,
        None => repo.find_all().await?,
    };
    Ok(views(quests))
}

/// Lists quests whose target or execution location lies within
/// `radius_km` of `center`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a negative or non-finite radius,
/// or the storage error that aborted the read.
pub async fn search_quests_by_radius<U>(
    center: GeoCoordinate,
    radius_km: f64,
    uow: &mut U,
) -> Result<Vec<QuestView>, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let fence = GeoFence::new(center, radius_km)?;
    let quests = uow.quest_repository().find_by_location(&fence).await?;
    Ok(views(quests))
}

/// Lists quests assigned to `user_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank user id, or the storage
/// error that aborted the read.
pub async fn list_assigned_quests<U>(
    user_id: &str,
    uow: &mut U,
) -> Result<Vec<QuestView>, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    if user_id.trim().is_empty() {
        return Err(DomainError::validation("user_id", "must not be blank"));
    }
    let quests = uow.quest_repository().find_by_assignee(user_id).await?;
    Ok(views(quests))
}

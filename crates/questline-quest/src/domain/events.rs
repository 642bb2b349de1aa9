//! Domain events for the Quest context.

use questline_core::event::{DomainEvent, EventMetadata};
use questline_core::geo::GeoCoordinate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{Difficulty, QuestStatus};

/// Event type name for `QuestCreated`.
pub const QUEST_CREATED_EVENT_TYPE: &str = "quest.quest_created";
/// Event type name for `QuestStatusChanged`.
pub const QUEST_STATUS_CHANGED_EVENT_TYPE: &str = "quest.quest_status_changed";
/// Event type name for `QuestAssigned`.
pub const QUEST_ASSIGNED_EVENT_TYPE: &str = "quest.quest_assigned";

/// Emitted when a quest is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCreated {
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
    /// Identity of the creator.
    pub creator: String,
}

/// Emitted when a quest moves along a status edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStatusChanged {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// Status before the change.
    pub from: QuestStatus,
    /// Status after the change.
    pub to: QuestStatus,
}

/// Emitted when a quest is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestAssigned {
    /// The quest identifier.
    pub quest_id: Uuid,
    /// Identity of the assignee.
    pub assignee: String,
}

/// Event payload variants for the Quest context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestEventKind {
    /// A quest has been created.
    QuestCreated(QuestCreated),
    /// A quest changed status.
    QuestStatusChanged(QuestStatusChanged),
    /// A quest has been assigned.
    QuestAssigned(QuestAssigned),
}

/// Domain event envelope for the Quest context.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: QuestEventKind,
}

impl DomainEvent for QuestEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            QuestEventKind::QuestCreated(_) => QUEST_CREATED_EVENT_TYPE,
            QuestEventKind::QuestStatusChanged(_) => QUEST_STATUS_CHANGED_EVENT_TYPE,
            QuestEventKind::QuestAssigned(_) => QUEST_ASSIGNED_EVENT_TYPE,
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
            QuestEventKind::QuestCreated(payload) => payload.quest_id,
            QuestEventKind::QuestStatusChanged(payload) => payload.quest_id,
            QuestEventKind::QuestAssigned(payload) => payload.quest_id,
        }
    }
}

//! Commands for the Quest context.

use questline_core::command::Command;
use questline_core::geo::GeoCoordinate;
use uuid::Uuid;

use super::status::{Difficulty, QuestStatus};

/// Command to create a new quest.
#[derive(Debug, Clone)]
pub struct CreateQuest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
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

impl Command for CreateQuest {
    fn command_type(&self) -> &'static str {
        "quest.create_quest"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move a quest along a status edge.
#[derive(Debug, Clone)]
pub struct ChangeQuestStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The quest identifier.
    pub quest_id: Uuid,
    /// The requested status.
    pub new_status: QuestStatus,
}

impl Command for ChangeQuestStatus {
    fn command_type(&self) -> &'static str {
        "quest.change_quest_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to assign a quest to a user.
#[derive(Debug, Clone)]
pub struct AssignQuest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The quest identifier.
    pub quest_id: Uuid,
    /// Identity of the assignee.
    pub assignee: String,
}

impl Command for AssignQuest {
    fn command_type(&self) -> &'static str {
        "quest.assign_quest"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

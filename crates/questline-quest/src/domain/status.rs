//! Quest status state machine and difficulty levels.

use std::fmt;
use std::str::FromStr;

use questline_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    /// Drafted by its creator, not yet visible to others.
    Created,
    /// Open for assignment.
    Posted,
    /// Taken by an assignee.
    Assigned,
    /// The assignee started working on it.
    InProgress,
    /// Finished.
    Completed,
    /// Abandoned by the assignee.
    Declined,
    /// Nobody finished it in time.
    Expired,
}

impl QuestStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [QuestStatus; 7] = [
        Self::Created,
        Self::Posted,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Declined,
        Self::Expired,
    ];

    /// The states reachable from this one in a single step.
    #[must_use]
    pub fn successors(self) -> &'static [QuestStatus] {
        match self {
            Self::Created => &[Self::Posted, Self::Expired],
            Self::Posted => &[Self::Assigned, Self::Expired],
            Self::Assigned => &[Self::InProgress, Self::Declined],
            Self::InProgress => &[Self::Completed, Self::Declined],
            Self::Completed | Self::Declined | Self::Expired => &[],
        }
    }

    /// Whether `self -> next` is a declared edge.
    #[must_use]
    pub fn can_transition_to(self, next: QuestStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Whether a quest in this state can be assigned.
    #[must_use]
    pub fn is_assignable(self) -> bool {
        matches!(self, Self::Posted)
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Stable storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Posted => "posted",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation("status", format!("unknown status {s:?}")))
    }
}

/// How hard a quest is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Easy.
    Easy,
    /// Medium.
    Medium,
    /// Hard.
    Hard,
}

impl Difficulty {
    /// Stable storage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(DomainError::validation(
                "difficulty",
                format!("unknown difficulty {other:?}"),
            )),
        }
    }
}

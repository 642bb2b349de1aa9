//! Aggregate roots for the Quest context.

use chrono::{DateTime, Utc};
use questline_core::aggregate::AggregateRoot;
use questline_core::clock::Clock;
use questline_core::error::DomainError;
use questline_core::event::EventMetadata;
use questline_core::geo::{GeoCoordinate, GeoFence};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::commands::CreateQuest;
use super::events::{
    QUEST_ASSIGNED_EVENT_TYPE, QUEST_CREATED_EVENT_TYPE, QUEST_STATUS_CHANGED_EVENT_TYPE,
    QuestAssigned, QuestCreated, QuestEvent, QuestEventKind, QuestStatusChanged,
};
use super::status::{Difficulty, QuestStatus};

/// Persisted state of a quest, as stored by repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    /// Quest identifier.
    pub id: Uuid,
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
    /// Required equipment, in order.
    pub equipment: Vec<String>,
    /// Required skills, in order.
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

/// The aggregate root for a quest.
#[derive(Debug, Clone)]
pub struct Quest {
    state: QuestRecord,
    /// Uncommitted events pending publication.
    uncommitted_events: Vec<QuestEvent>,
}

fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn require_entries(field: &str, values: &[String]) -> Result<(), DomainError> {
    for (index, value) in values.iter().enumerate() {
        require_text(&format!("{field}[{index}]"), value)?;
    }
    Ok(())
}

impl Quest {
    /// Creates a quest in status `Created`, producing a `QuestCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first invalid field.
    pub fn create(command: &CreateQuest, clock: &dyn Clock) -> Result<Self, DomainError> {
        require_text("title", &command.title)?;
        require_text("description", &command.description)?;
        if command.reward == 0 {
            return Err(DomainError::validation("reward", "must be greater than zero"));
        }
        if command.duration_minutes == 0 {
            return Err(DomainError::validation(
                "duration_minutes",
                "must be greater than zero",
            ));
        }
        require_entries("equipment", &command.equipment)?;
        require_entries("skills", &command.skills)?;
        require_text("creator", &command.creator)?;

        let now = clock.now();
        let state = QuestRecord {
            id: Uuid::now_v7(),
            title: command.title.clone(),
            description: command.description.clone(),
            difficulty: command.difficulty,
            reward: command.reward,
            duration_minutes: command.duration_minutes,
            target_location: command.target_location,
            execution_location: command.execution_location,
            equipment: command.equipment.clone(),
            skills: command.skills.clone(),
            status: QuestStatus::Created,
            creator: command.creator.clone(),
            assignee: None,
            created_at: now,
            updated_at: now,
        };

        let event = QuestEvent {
            metadata: EventMetadata::new(QUEST_CREATED_EVENT_TYPE, command.correlation_id, now),
            kind: QuestEventKind::QuestCreated(QuestCreated {
                quest_id: state.id,
                title: state.title.clone(),
                description: state.description.clone(),
                difficulty: state.difficulty,
                reward: state.reward,
                duration_minutes: state.duration_minutes,
                target_location: state.target_location,
                execution_location: state.execution_location,
                equipment: state.equipment.clone(),
                skills: state.skills.clone(),
                creator: state.creator.clone(),
            }),
        };

        Ok(Self {
            state,
            uncommitted_events: vec![event],
        })
    }

    /// Rebuilds a quest from persisted state. No events are pending.
    #[must_use]
    pub fn restore(record: QuestRecord) -> Self {
        Self {
            state: record,
            uncommitted_events: Vec::new(),
        }
    }

    /// Moves the quest along a declared status edge, producing a
    /// `QuestStatusChanged` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` if the edge is not declared. The
    /// status is unchanged on error. Moving to `Assigned` this way leaves the
    /// assignee untouched; only [`Quest::assign_to`] sets it.
    pub fn change_status(
        &mut self,
        new_status: QuestStatus,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let from = self.state.status;
        if !from.can_transition_to(new_status) {
            return Err(DomainError::InvalidState(format!(
                "quest {} cannot move from {from} to {new_status}",
                self.state.id
            )));
        }

        let now = clock.now();
        self.state.status = new_status;
        self.state.updated_at = now;
        self.uncommitted_events.push(QuestEvent {
            metadata: EventMetadata::new(QUEST_STATUS_CHANGED_EVENT_TYPE, correlation_id, now),
            kind: QuestEventKind::QuestStatusChanged(QuestStatusChanged {
                quest_id: self.state.id,
                from,
                to: new_status,
            }),
        });
        Ok(())
    }

    /// Assigns the quest to `user_id` and moves it to `Assigned`, producing a
    /// `QuestAssigned` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank user id, and
    /// `DomainError::InvalidState` if the quest already has an assignee or
    /// its status is not assignable.
    pub fn assign_to(
        &mut self,
        user_id: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        require_text("assignee", user_id)?;
        if let Some(current) = &self.state.assignee {
            return Err(DomainError::InvalidState(format!(
                "quest {} is already assigned to {current}",
                self.state.id
            )));
        }
        if !self.state.status.is_assignable() {
            return Err(DomainError::InvalidState(format!(
                "quest {} cannot be assigned while {}",
                self.state.id, self.state.status
            )));
        }

        let now = clock.now();
        self.state.assignee = Some(user_id.to_owned());
        self.state.status = QuestStatus::Assigned;
        self.state.updated_at = now;
        self.uncommitted_events.push(QuestEvent {
            metadata: EventMetadata::new(QUEST_ASSIGNED_EVENT_TYPE, correlation_id, now),
            kind: QuestEventKind::QuestAssigned(QuestAssigned {
                quest_id: self.state.id,
                assignee: user_id.to_owned(),
            }),
        });
        Ok(())
    }

    /// Phase 1 of the radius search: either coordinate is inside the box.
    #[must_use]
    pub fn may_be_within(&self, fence: &GeoFence) -> bool {
        fence.may_contain(&self.state.target_location)
            || fence.may_contain(&self.state.execution_location)
    }

    /// Phase 2 of the radius search: either coordinate is within the radius.
    #[must_use]
    pub fn is_within(&self, fence: &GeoFence) -> bool {
        fence.contains(&self.state.target_location) || fence.contains(&self.state.execution_location)
    }

    /// The persisted state.
    #[must_use]
    pub fn record(&self) -> &QuestRecord {
        &self.state
    }

    /// Quest identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.state.id
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> QuestStatus {
        self.state.status
    }

    /// Assignee, if any.
    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        self.state.assignee.as_deref()
    }

    /// Identity of the creator.
    #[must_use]
    pub fn creator(&self) -> &str {
        &self.state.creator
    }
}

impl AggregateRoot for Quest {
    type Event = QuestEvent;

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

#[cfg(test)]
mod tests {
    use super::*;
    use questline_core::event::DomainEvent;
    use questline_test_support::{FixedClock, fixed_now, moscow, point};

    fn create_command() -> CreateQuest {
        CreateQuest {
            correlation_id: Uuid::new_v4(),
            title: "Find the lost cat".to_owned(),
            description: "Grey, answers to Pushok".to_owned(),
            difficulty: Difficulty::Medium,
            reward: 150,
            duration_minutes: 90,
            target_location: moscow(),
            execution_location: point(55.7601, 37.6187),
            equipment: vec!["flashlight".to_owned(), "treats".to_owned()],
            skills: vec!["patience".to_owned()],
            creator: "user-1".to_owned(),
        }
    }

    fn posted_quest(clock: &FixedClock) -> Quest {
        let mut quest = Quest::create(&create_command(), clock).unwrap();
        quest
            .change_status(QuestStatus::Posted, Uuid::new_v4(), clock)
            .unwrap();
        quest.clear_uncommitted_events();
        quest
    }

    fn validation_field(err: DomainError) -> String {
        match err {
            DomainError::Validation { field, .. } => field,
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_create_produces_quest_created_event() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let command = create_command();

        // Act
        let quest = Quest::create(&command, &clock).unwrap();

        // Assert
        assert_eq!(quest.status(), QuestStatus::Created);
        assert_eq!(quest.assignee(), None);
        assert_eq!(quest.record().created_at, fixed_now());
        assert_eq!(quest.record().updated_at, fixed_now());

        let events = quest.uncommitted_events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type(), QUEST_CREATED_EVENT_TYPE);
        assert_eq!(event.aggregate_id(), quest.id());
        assert_eq!(event.metadata().correlation_id, command.correlation_id);
        assert_eq!(event.metadata().occurred_at, fixed_now());

        match &event.kind {
            QuestEventKind::QuestCreated(payload) => {
                assert_eq!(payload.quest_id, quest.id());
                assert_eq!(payload.title, "Find the lost cat");
                assert_eq!(payload.equipment, vec!["flashlight", "treats"]);
                assert_eq!(payload.creator, "user-1");
            }
            other => panic!("expected QuestCreated, got {other:?}"),
        }
    }

    #[test]
    fn test_create_reports_first_invalid_field() {
        let clock = FixedClock(fixed_now());

        let mut command = create_command();
        command.title = "   ".to_owned();
        command.creator = String::new();
        assert_eq!(validation_field(Quest::create(&command, &clock).unwrap_err()), "title");

        let mut command = create_command();
        command.description = String::new();
        assert_eq!(
            validation_field(Quest::create(&command, &clock).unwrap_err()),
            "description"
        );

        let mut command = create_command();
        command.reward = 0;
        assert_eq!(validation_field(Quest::create(&command, &clock).unwrap_err()), "reward");

        let mut command = create_command();
        command.duration_minutes = 0;
        assert_eq!(
            validation_field(Quest::create(&command, &clock).unwrap_err()),
            "duration_minutes"
        );

        let mut command = create_command();
        command.skills.push(" ".to_owned());
        assert_eq!(
            validation_field(Quest::create(&command, &clock).unwrap_err()),
            "skills[1]"
        );

        let mut command = create_command();
        command.creator = String::new();
        assert_eq!(validation_field(Quest::create(&command, &clock).unwrap_err()), "creator");
    }

    #[test]
    fn test_change_status_along_declared_edge() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut quest = Quest::create(&create_command(), &clock).unwrap();
        quest.clear_uncommitted_events();
        let correlation_id = Uuid::new_v4();

        // Act
        quest
            .change_status(QuestStatus::Posted, correlation_id, &clock)
            .unwrap();

        // Assert
        assert_eq!(quest.status(), QuestStatus::Posted);
        let events = quest.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), QUEST_STATUS_CHANGED_EVENT_TYPE);
        assert_eq!(events[0].metadata().correlation_id, correlation_id);
        match &events[0].kind {
            QuestEventKind::QuestStatusChanged(payload) => {
                assert_eq!(payload.quest_id, quest.id());
                assert_eq!(payload.from, QuestStatus::Created);
                assert_eq!(payload.to, QuestStatus::Posted);
            }
            other => panic!("expected QuestStatusChanged, got {other:?}"),
        }
    }

    #[test]
    fn test_change_status_along_undeclared_edge_leaves_status_unchanged() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut quest = Quest::create(&create_command(), &clock).unwrap();
        quest.clear_uncommitted_events();

        // Act
        let result = quest.change_status(QuestStatus::Completed, Uuid::new_v4(), &clock);

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(quest.status(), QuestStatus::Created);
        assert!(quest.uncommitted_events().is_empty());
    }

    #[test]
    fn test_change_status_from_posted_to_assigned_follows_declared_edge() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut quest = posted_quest(&clock);

        // Act
        quest
            .change_status(QuestStatus::Assigned, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        assert_eq!(quest.status(), QuestStatus::Assigned);
        assert_eq!(quest.assignee(), None);
        let events = quest.uncommitted_events();
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            QuestEventKind::QuestStatusChanged(changed) => {
                assert_eq!(changed.from, QuestStatus::Posted);
                assert_eq!(changed.to, QuestStatus::Assigned);
            }
            other => panic!("expected QuestStatusChanged, got {other:?}"),
        }
    }

    #[test]
    fn test_change_status_from_created_to_assigned_fails() {
        let clock = FixedClock(fixed_now());
        let mut quest = Quest::create(&create_command(), &clock).unwrap();

        let result = quest.change_status(QuestStatus::Assigned, Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(quest.status(), QuestStatus::Created);
    }

    #[test]
    fn test_assign_to_posted_quest() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut quest = posted_quest(&clock);

        // Act
        quest.assign_to("user-2", Uuid::new_v4(), &clock).unwrap();

        // Assert
        assert_eq!(quest.status(), QuestStatus::Assigned);
        assert_eq!(quest.assignee(), Some("user-2"));
        let events = quest.uncommitted_events();
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            QuestEventKind::QuestAssigned(payload) => {
                assert_eq!(payload.quest_id, quest.id());
                assert_eq!(payload.assignee, "user-2");
            }
            other => panic!("expected QuestAssigned, got {other:?}"),
        }
    }

    #[test]
    fn test_assign_to_created_quest_fails() {
        let clock = FixedClock(fixed_now());
        let mut quest = Quest::create(&create_command(), &clock).unwrap();

        let result = quest.assign_to("user-2", Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert_eq!(quest.status(), QuestStatus::Created);
        assert_eq!(quest.assignee(), None);
    }

    #[test]
    fn test_assign_to_already_assigned_quest_fails() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut quest = posted_quest(&clock);
        quest.assign_to("user-2", Uuid::new_v4(), &clock).unwrap();
        quest.clear_uncommitted_events();

        // Act
        let result = quest.assign_to("user-3", Uuid::new_v4(), &clock);

        // Assert
        match result.unwrap_err() {
            DomainError::InvalidState(msg) => assert!(msg.contains("already assigned to user-2")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
        assert_eq!(quest.assignee(), Some("user-2"));
        assert!(quest.uncommitted_events().is_empty());
    }

    #[test]
    fn test_assign_to_blank_user_is_a_validation_error() {
        let clock = FixedClock(fixed_now());
        let mut quest = posted_quest(&clock);

        let result = quest.assign_to("  ", Uuid::new_v4(), &clock);

        assert_eq!(validation_field(result.unwrap_err()), "assignee");
    }

    #[test]
    fn test_events_accumulate_in_causal_order() {
        let clock = FixedClock(fixed_now());
        let mut quest = Quest::create(&create_command(), &clock).unwrap();
        quest
            .change_status(QuestStatus::Posted, Uuid::new_v4(), &clock)
            .unwrap();
        quest.assign_to("user-2", Uuid::new_v4(), &clock).unwrap();

        let types: Vec<_> = quest
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect();

        assert_eq!(
            types,
            vec![
                QUEST_CREATED_EVENT_TYPE,
                QUEST_STATUS_CHANGED_EVENT_TYPE,
                QUEST_ASSIGNED_EVENT_TYPE
            ]
        );
    }

    #[test]
    fn test_restore_has_no_pending_events() {
        let clock = FixedClock(fixed_now());
        let quest = Quest::create(&create_command(), &clock).unwrap();

        let restored = Quest::restore(quest.record().clone());

        assert_eq!(restored.record(), quest.record());
        assert!(restored.uncommitted_events().is_empty());
    }

    #[test]
    fn test_is_within_matches_either_coordinate() {
        // Arrange: target far away, execution at the search center.
        let clock = FixedClock(fixed_now());
        let mut command = create_command();
        command.target_location = point(48.8566, 2.3522);
        command.execution_location = moscow();
        let quest = Quest::create(&command, &clock).unwrap();
        let fence = GeoFence::new(moscow(), 1.0).unwrap();

        // Act / Assert
        assert!(quest.may_be_within(&fence));
        assert!(quest.is_within(&fence));
    }
}

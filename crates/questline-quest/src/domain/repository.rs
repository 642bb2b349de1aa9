//! Persistence ports for quests.

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::geo::GeoFence;
use questline_core::unit_of_work::Tracker;
use uuid::Uuid;

use super::aggregates::Quest;
use super::status::QuestStatus;

/// Repository for quest aggregates. Implementations run every call through
/// the transaction of the tracker they were obtained from.
#[async_trait]
pub trait QuestRepository: Send {
    /// Inserts or replaces the quest by id.
    async fn save(&mut self, quest: &Quest) -> Result<(), DomainError>;

    /// Loads a quest.
    ///
    /// Returns `DomainError::AggregateNotFound` if it does not exist.
    async fn get_by_id(&mut self, quest_id: Uuid) -> Result<Quest, DomainError>;

    /// Loads a quest for a read-modify-write. Stores with row locks keep
    /// the row locked until the surrounding transaction ends, so two
    /// concurrent writers serialize instead of both acting on the same
    /// snapshot.
    ///
    /// Returns `DomainError::AggregateNotFound` if it does not exist.
    async fn load_for_update(&mut self, quest_id: Uuid) -> Result<Quest, DomainError> {
        self.get_by_id(quest_id).await
    }

    /// Quests whose target or execution location lies within the fence:
    /// a bounding-box prefilter followed by the exact distance check.
    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Quest>, DomainError>;

    /// Quests assigned to `user_id`.
    async fn find_by_assignee(&mut self, user_id: &str) -> Result<Vec<Quest>, DomainError>;

    /// Quests in `status`.
    async fn find_by_status(&mut self, status: QuestStatus) -> Result<Vec<Quest>, DomainError>;

    /// Every quest.
    async fn find_all(&mut self) -> Result<Vec<Quest>, DomainError>;
}

/// A tracker that can hand out quest repositories sharing its transaction.
pub trait QuestUnitOfWork: Tracker {
    /// The quest repository bound to this unit of work.
    fn quest_repository(&mut self) -> Box<dyn QuestRepository + '_>;
}

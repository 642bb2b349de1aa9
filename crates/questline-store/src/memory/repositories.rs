//! Repositories over a [`MemoryTracker`].

use async_trait::async_trait;
use questline_core::error::DomainError;
use questline_core::event::EventRecord;
use questline_core::geo::GeoFence;
use questline_core::unit_of_work::EventRecordRepository;
use questline_location::domain::aggregates::{Location, LocationRecord};
use questline_location::domain::repository::LocationRepository;
use questline_quest::domain::aggregates::{Quest, QuestRecord};
use questline_quest::domain::repository::QuestRepository;
use questline_quest::domain::status::QuestStatus;
use uuid::Uuid;

use super::MemoryTracker;

/// Quests in storage order: creation time, then id.
fn quests_where(tracker: &MemoryTracker, keep: impl Fn(&Quest) -> bool) -> Vec<Quest> {
    let mut records: Vec<QuestRecord> = tracker.snapshot().quests;
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    records
        .into_iter()
        .map(Quest::restore)
        .filter(|quest| keep(quest))
        .collect()
}

fn locations_where(tracker: &MemoryTracker, keep: impl Fn(&Location) -> bool) -> Vec<Location> {
    let mut records: Vec<LocationRecord> = tracker.snapshot().locations;
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    records
        .into_iter()
        .map(Location::restore)
        .filter(|location| keep(location))
        .collect()
}

/// Quest repository bound to a memory tracker.
#[derive(Debug)]
pub struct MemoryQuestRepository<'a> {
    tracker: &'a mut MemoryTracker,
}

impl<'a> MemoryQuestRepository<'a> {
    pub(super) fn new(tracker: &'a mut MemoryTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl QuestRepository for MemoryQuestRepository<'_> {
    async fn save(&mut self, quest: &Quest) -> Result<(), DomainError> {
        self.tracker.ctx.ensure_active("saving quest")?;
        let record = quest.record().clone();
        self.tracker.write(|tables| tables.upsert_quest(record));
        Ok(())
    }

    async fn get_by_id(&mut self, quest_id: Uuid) -> Result<Quest, DomainError> {
        self.tracker.ctx.ensure_active("loading quest")?;
        self.tracker
            .snapshot()
            .quests
            .into_iter()
            .find(|row| row.id == quest_id)
            .map(Quest::restore)
            .ok_or(DomainError::AggregateNotFound(quest_id))
    }

    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Quest>, DomainError> {
        self.tracker.ctx.ensure_active("searching quests by location")?;
        Ok(quests_where(self.tracker, |quest| {
            quest.may_be_within(fence) && quest.is_within(fence)
        }))
    }

    async fn find_by_assignee(&mut self, user_id: &str) -> Result<Vec<Quest>, DomainError> {
        self.tracker.ctx.ensure_active("listing quests by assignee")?;
        Ok(quests_where(self.tracker, |quest| {
            quest.assignee() == Some(user_id)
        }))
    }

    async fn find_by_status(&mut self, status: QuestStatus) -> Result<Vec<Quest>, DomainError> {
        self.tracker.ctx.ensure_active("listing quests by status")?;
        Ok(quests_where(self.tracker, |quest| quest.status() == status))
    }

    async fn find_all(&mut self) -> Result<Vec<Quest>, DomainError> {
        self.tracker.ctx.ensure_active("listing quests")?;
        Ok(quests_where(self.tracker, |_| true))
    }
}

/// Location repository bound to a memory tracker.
#[derive(Debug)]
pub struct MemoryLocationRepository<'a> {
    tracker: &'a mut MemoryTracker,
}

impl<'a> MemoryLocationRepository<'a> {
    pub(super) fn new(tracker: &'a mut MemoryTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl LocationRepository for MemoryLocationRepository<'_> {
    async fn save(&mut self, location: &Location) -> Result<(), DomainError> {
        self.tracker.ctx.ensure_active("saving location")?;
        let record = location.record().clone();
        self.tracker.write(|tables| tables.upsert_location(record));
        Ok(())
    }

    async fn get_by_id(&mut self, location_id: Uuid) -> Result<Location, DomainError> {
        self.tracker.ctx.ensure_active("loading location")?;
        self.tracker
            .snapshot()
            .locations
            .into_iter()
            .find(|row| row.id == location_id)
            .map(Location::restore)
            .ok_or(DomainError::AggregateNotFound(location_id))
    }

    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Location>, DomainError> {
        self.tracker.ctx.ensure_active("searching locations by location")?;
        Ok(locations_where(self.tracker, |location| {
            location.may_be_within(fence) && location.is_within(fence)
        }))
    }

    async fn find_all(&mut self) -> Result<Vec<Location>, DomainError> {
        self.tracker.ctx.ensure_active("listing locations")?;
        Ok(locations_where(self.tracker, |_| true))
    }
}

/// Event history bound to a memory tracker.
#[derive(Debug)]
pub struct MemoryEventRecordRepository<'a> {
    tracker: &'a mut MemoryTracker,
}

impl<'a> MemoryEventRecordRepository<'a> {
    pub(super) fn new(tracker: &'a mut MemoryTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl EventRecordRepository for MemoryEventRecordRepository<'_> {
    async fn append(&mut self, record: &EventRecord) -> Result<(), DomainError> {
        self.tracker.ctx.ensure_active("appending event record")?;
        if self.tracker.event_appends_fail() {
            return Err(DomainError::infrastructure(
                format!("appending event record {}", record.id),
                "event store unavailable",
            ));
        }
        if self.tracker.event_exists(record.id) {
            return Err(DomainError::infrastructure(
                format!("appending event record {}", record.id),
                "duplicate event id",
            ));
        }
        let record = record.clone();
        self.tracker.write(|tables| tables.events.push(record));
        Ok(())
    }

    async fn load_by_aggregate(
        &mut self,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, DomainError> {
        self.tracker.ctx.ensure_active("loading event records")?;
        Ok(self
            .tracker
            .snapshot()
            .events
            .into_iter()
            .filter(|row| row.aggregate_id == aggregate_id)
            .collect())
    }
}

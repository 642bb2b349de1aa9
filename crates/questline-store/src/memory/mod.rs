//! In-process store.
//!
//! Committed state lives in shared tables behind a mutex. A tracker with an
//! open transaction stages its writes privately and applies them to the
//! tables in one step on commit; reads see the committed tables overlaid with
//! the tracker's own staged writes. Without a transaction every write
//! applies immediately. There are no row locks: concurrent read-modify-writes
//! of the same row resolve last writer wins.

mod repositories;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use questline_core::context::OperationContext;
use questline_core::error::DomainError;
use questline_core::event::EventRecord;
use questline_core::unit_of_work::{EventRecordRepository, Tracker};
use questline_location::domain::aggregates::LocationRecord;
use questline_location::domain::repository::{LocationRepository, LocationUnitOfWork};
use questline_quest::domain::aggregates::QuestRecord;
use questline_quest::domain::repository::{QuestRepository, QuestUnitOfWork};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

pub use repositories::{MemoryEventRecordRepository, MemoryLocationRepository, MemoryQuestRepository};

/// Rows of every table, in insertion order.
#[derive(Debug, Default, Clone)]
struct Tables {
    quests: Vec<QuestRecord>,
    locations: Vec<LocationRecord>,
    events: Vec<EventRecord>,
}

impl Tables {
    fn upsert_quest(&mut self, record: QuestRecord) {
        match self.quests.iter_mut().find(|row| row.id == record.id) {
            Some(row) => *row = record,
            None => self.quests.push(record),
        }
    }

    fn upsert_location(&mut self, record: LocationRecord) {
        match self.locations.iter_mut().find(|row| row.id == record.id) {
            Some(row) => *row = record,
            None => self.locations.push(record),
        }
    }

    fn has_event(&self, event_id: Uuid) -> bool {
        self.events.iter().any(|row| row.id == event_id)
    }

    fn apply(&mut self, writes: Tables) {
        for quest in writes.quests {
            self.upsert_quest(quest);
        }
        for location in writes.locations {
            self.upsert_location(location);
        }
        self.events.extend(writes.events);
    }
}

#[derive(Debug)]
struct Shared {
    tables: Mutex<Tables>,
    permits: Arc<Semaphore>,
    fail_event_appends: AtomicBool,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An in-process store handing out [`MemoryTracker`]s.
///
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                permits: Arc::new(Semaphore::new(config.max_concurrent_units.get())),
                fail_event_appends: AtomicBool::new(false),
            }),
        }
    }

    /// A tracker working for `ctx`, with no open transaction.
    #[must_use]
    pub fn tracker(&self, ctx: OperationContext) -> MemoryTracker {
        MemoryTracker {
            shared: Arc::clone(&self.shared),
            ctx,
            pending: None,
        }
    }

    /// Makes every subsequent event append fail with an infrastructure
    /// error, until switched off again.
    pub fn fail_event_appends(&self, fail: bool) {
        self.shared.fail_event_appends.store(fail, Ordering::SeqCst);
    }

    /// A copy of the committed event history, in insertion order.
    #[must_use]
    pub fn committed_events(&self) -> Vec<EventRecord> {
        self.shared.tables().events.clone()
    }

    /// A copy of the committed quest rows.
    #[must_use]
    pub fn committed_quests(&self) -> Vec<QuestRecord> {
        self.shared.tables().quests.clone()
    }

    /// Number of transaction slots currently free.
    #[must_use]
    pub fn available_slots(&self) -> usize {
        self.shared.permits.available_permits()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl UnitOfWorkFactory for MemoryStore {
    fn unit_of_work(&self, ctx: OperationContext) -> Box<dyn UnitOfWork> {
        Box::new(self.tracker(ctx))
    }
}

#[derive(Debug)]
struct Pending {
    writes: Tables,
    _permit: OwnedSemaphorePermit,
}

/// Unit of work over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTracker {
    shared: Arc<Shared>,
    ctx: OperationContext,
    pending: Option<Pending>,
}

impl MemoryTracker {
    /// Committed tables overlaid with this tracker's staged writes.
    fn snapshot(&self) -> Tables {
        let mut tables = self.shared.tables().clone();
        if let Some(pending) = &self.pending {
            tables.apply(pending.writes.clone());
        }
        tables
    }

    /// Stages `write` when a transaction is open, otherwise applies it to the
    /// committed tables directly.
    fn write(&mut self, write: impl FnOnce(&mut Tables)) {
        match &mut self.pending {
            Some(pending) => write(&mut pending.writes),
            None => write(&mut self.shared.tables()),
        }
    }

    fn event_exists(&self, event_id: Uuid) -> bool {
        let staged = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.writes.has_event(event_id));
        staged || self.shared.tables().has_event(event_id)
    }

    fn event_appends_fail(&self) -> bool {
        self.shared.fail_event_appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tracker for MemoryTracker {
    async fn begin(&mut self) -> Result<(), DomainError> {
        if self.pending.is_some() {
            return Err(DomainError::Precondition(
                "transaction already open".to_owned(),
            ));
        }
        let permits = Arc::clone(&self.shared.permits);
        let permit = self
            .ctx
            .run("waiting for a transaction slot", async move {
                permits
                    .acquire_owned()
                    .await
                    .map_err(|err| DomainError::infrastructure("acquiring transaction slot", err))
            })
            .await?;
        self.pending = Some(Pending {
            writes: Tables::default(),
            _permit: permit,
        });
        debug!("memory transaction opened");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| DomainError::Precondition("no open transaction".to_owned()))?;
        self.ctx.ensure_active("committing transaction")?;
        self.shared.tables().apply(pending.writes);
        debug!("memory transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) {
        if self.pending.take().is_some() {
            debug!("memory transaction rolled back");
        }
    }

    fn in_tx(&self) -> bool {
        self.pending.is_some()
    }

    fn context(&self) -> &OperationContext {
        &self.ctx
    }

    fn event_records(&mut self) -> Box<dyn EventRecordRepository + '_> {
        Box::new(MemoryEventRecordRepository::new(self))
    }
}

impl QuestUnitOfWork for MemoryTracker {
    fn quest_repository(&mut self) -> Box<dyn QuestRepository + '_> {
        Box::new(MemoryQuestRepository::new(self))
    }
}

impl LocationUnitOfWork for MemoryTracker {
    fn location_repository(&mut self) -> Box<dyn LocationRepository + '_> {
        Box::new(MemoryLocationRepository::new(self))
    }
}

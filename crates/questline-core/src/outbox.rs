//! Event outbox: writes domain events into the event history through a
//! tracker's transaction.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventRecord};
use crate::unit_of_work::Tracker;

/// Publishes domain events as [`EventRecord`] rows.
///
/// If the tracker already has an open transaction the records join it and
/// the caller decides whether to commit. Otherwise the publisher opens its
/// own transaction and commits or rolls it back itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventPublisher;

impl EventPublisher {
    /// Creates a publisher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Writes `events` in the given order.
    ///
    /// An empty slice succeeds without touching the tracker.
    ///
    /// # Errors
    ///
    /// Returns the mapping or insert error. A transaction the publisher
    /// opened is rolled back first; a caller-owned transaction is left for
    /// the caller to roll back.
    pub async fn publish<T, E>(&self, tracker: &mut T, events: &[E]) -> Result<(), DomainError>
    where
        T: Tracker + ?Sized,
        E: DomainEvent,
    {
        if events.is_empty() {
            return Ok(());
        }

        let owns_tx = !tracker.in_tx();
        if owns_tx {
            tracker.begin().await?;
        }

        if let Err(err) = Self::write_all(tracker, events).await {
            if owns_tx {
                warn!(error = %err, "event publication failed, rolling back");
                tracker.rollback().await;
            }
            return Err(err);
        }

        if owns_tx {
            if let Err(err) = tracker.commit().await {
                tracker.rollback().await;
                return Err(err);
            }
        }

        Ok(())
    }

    /// Publishes the aggregate's pending events into the tracker's open
    /// transaction and commits it, finishing a unit of work whose aggregate
    /// write is already staged.
    ///
    /// The pending events are cleared only after the commit succeeds. On any
    /// failure the transaction is rolled back and the events stay pending, so
    /// retrying the whole unit publishes them again.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if no transaction is open,
    /// otherwise the first publish or commit error.
    pub async fn commit_aggregate<T, A>(
        &self,
        tracker: &mut T,
        aggregate: &mut A,
    ) -> Result<Vec<Uuid>, DomainError>
    where
        T: Tracker + ?Sized,
        A: AggregateRoot,
    {
        if !tracker.in_tx() {
            return Err(DomainError::Precondition(
                "committing an aggregate needs an open transaction".to_owned(),
            ));
        }

        let published = self.publish(tracker, aggregate.uncommitted_events()).await;
        let outcome = match published {
            Ok(()) => tracker.commit().await,
            Err(err) => Err(err),
        };
        if let Err(err) = outcome {
            tracker.rollback().await;
            return Err(err);
        }

        let event_ids = aggregate
            .uncommitted_events()
            .iter()
            .map(|event| event.metadata().event_id)
            .collect();
        aggregate.clear_uncommitted_events();
        Ok(event_ids)
    }

    async fn write_all<T, E>(tracker: &mut T, events: &[E]) -> Result<(), DomainError>
    where
        T: Tracker + ?Sized,
        E: DomainEvent,
    {
        let mut records = tracker.event_records();
        for event in events {
            let record = EventRecord::from_event(event)?;
            debug!(
                event_id = %record.id,
                event_type = %record.event_type,
                aggregate_id = %record.aggregate_id,
                "appending event record"
            );
            records.append(&record).await?;
        }
        Ok(())
    }
}

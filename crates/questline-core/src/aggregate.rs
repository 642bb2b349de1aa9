//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for state-stored aggregate roots that buffer the events their
/// operations produce until the events are published.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns events produced by command handling that have not been
    /// published yet, in the order they were produced.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events. Call only after publication committed.
    fn clear_uncommitted_events(&mut self);
}

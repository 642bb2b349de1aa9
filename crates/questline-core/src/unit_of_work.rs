//! Unit of work: one transaction slot shared by the repositories of a
//! single logical operation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::OperationContext;
use crate::error::DomainError;
use crate::event::EventRecord;

/// Append-only access to the event history through a tracker's
/// transaction.
#[async_trait]
pub trait EventRecordRepository: Send {
    /// Inserts one record. Records are never updated.
    async fn append(&mut self, record: &EventRecord) -> Result<(), DomainError>;

    /// Loads the records of one aggregate in insertion order.
    async fn load_by_aggregate(&mut self, aggregate_id: Uuid) -> Result<Vec<EventRecord>, DomainError>;
}

/// Owns the transaction lifecycle of one logical operation.
///
/// A tracker holds at most one open transaction. Repositories obtained from
/// it borrow that transaction, so every write made through them commits or
/// rolls back together. Methods take `&mut self`: one tracker serves one
/// in-flight operation.
#[async_trait]
pub trait Tracker: Send {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if a transaction is already open,
    /// `DomainError::Cancelled` if the operation expired while waiting for
    /// capacity, or `DomainError::Infrastructure` if the store refuses.
    async fn begin(&mut self) -> Result<(), DomainError>;

    /// Commits the open transaction and clears the slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if no transaction is open, or
    /// `DomainError::Infrastructure` if the commit fails. The slot is cleared
    /// either way.
    async fn commit(&mut self) -> Result<(), DomainError>;

    /// Rolls back the open transaction, if any, and clears the slot.
    /// Safe to call repeatedly or with nothing open. Store failures are
    /// logged rather than returned.
    async fn rollback(&mut self);

    /// Whether a transaction is currently open.
    fn in_tx(&self) -> bool;

    /// The operation this tracker works for.
    fn context(&self) -> &OperationContext;

    /// The event history, bound to this tracker's transaction.
    fn event_records(&mut self) -> Box<dyn EventRecordRepository + '_>;
}

//! The combined unit of work handed to request handlers.

use questline_core::context::OperationContext;
use questline_location::domain::repository::LocationUnitOfWork;
use questline_quest::domain::repository::QuestUnitOfWork;

/// A tracker exposing every repository in the system over one transaction.
pub trait UnitOfWork: QuestUnitOfWork + LocationUnitOfWork {}

impl<T> UnitOfWork for T where T: QuestUnitOfWork + LocationUnitOfWork {}

/// Creates one unit of work per logical operation.
pub trait UnitOfWorkFactory: Send + Sync {
    /// A fresh unit of work with no open transaction, working for `ctx`.
    fn unit_of_work(&self, ctx: OperationContext) -> Box<dyn UnitOfWork>;
}

//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through its events.
    fn correlation_id(&self) -> Uuid;
}

/// What a successfully handled command persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CommandOutcome {
    /// The aggregate the command acted on.
    pub aggregate_id: Uuid,
    /// IDs of the events written to the event history, in order.
    pub event_ids: Vec<Uuid>,
}

//! Domain event abstractions and the outbox record they are stored as.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name, e.g. `quest.quest_created`.
    pub event_type: String,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for a fresh event with a time-ordered identifier.
    #[must_use]
    pub fn new(event_type: &str, correlation_id: Uuid, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.to_owned(),
            correlation_id,
            occurred_at,
        }
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Serializes the variant payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// The aggregate this event is filed under in the event history.
    ///
    /// Event families override this with a per-variant mapping to their
    /// aggregate id field. Events without a mapping are filed under their
    /// own event id.
    fn aggregate_id(&self) -> Uuid {
        self.metadata().event_id
    }
}

/// Stored representation of a published domain event (one outbox row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event identifier, primary key.
    pub id: Uuid,
    /// Event type name.
    pub event_type: String,
    /// Aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Translates a typed event into its outbox record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload fails to serialize.
    pub fn from_event<E: DomainEvent + ?Sized>(event: &E) -> Result<Self, DomainError> {
        let meta = event.metadata();
        let payload = event.to_payload().map_err(|err| {
            DomainError::infrastructure(
                format!("serializing {} event {}", event.event_type(), meta.event_id),
                err,
            )
        })?;

        Ok(Self {
            id: meta.event_id,
            event_type: event.event_type().to_owned(),
            aggregate_id: event.aggregate_id(),
            payload,
            correlation_id: meta.correlation_id,
            created_at: meta.occurred_at,
        })
    }
}

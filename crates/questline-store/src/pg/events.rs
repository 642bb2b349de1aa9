//! Event history on `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use questline_core::event::EventRecord;
use questline_core::unit_of_work::EventRecordRepository;
use sqlx::FromRow;
use uuid::Uuid;

use super::PgTracker;

const INSERT_EVENT_RECORD: &str = r"
INSERT INTO event_records (id, event_type, aggregate_id, payload, correlation_id, created_at)
VALUES ($1, $2, $3, $4, $5, $6)";

const SELECT_BY_AGGREGATE: &str = r"
SELECT id, event_type, aggregate_id, payload, correlation_id, created_at
FROM event_records
WHERE aggregate_id = $1
ORDER BY position";

#[derive(Debug, FromRow)]
struct EventRecordRow {
    id: Uuid,
    event_type: String,
    aggregate_id: Uuid,
    payload: serde_json::Value,
    correlation_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<EventRecordRow> for EventRecord {
    fn from(row: EventRecordRow) -> Self {
        Self {
            id: row.id,
            event_type: row.event_type,
            aggregate_id: row.aggregate_id,
            payload: row.payload,
            correlation_id: row.correlation_id,
            created_at: row.created_at,
        }
    }
}

/// Append-only event history bound to a [`PgTracker`].
#[derive(Debug)]
pub struct PgEventRecordRepository<'a> {
    tracker: &'a mut PgTracker,
}

impl<'a> PgEventRecordRepository<'a> {
    pub(super) fn new(tracker: &'a mut PgTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl EventRecordRepository for PgEventRecordRepository<'_> {
    async fn append(&mut self, record: &EventRecord) -> Result<(), DomainError> {
        let query = sqlx::query(INSERT_EVENT_RECORD)
            .bind(record.id)
            .bind(&record.event_type)
            .bind(record.aggregate_id)
            .bind(&record.payload)
            .bind(record.correlation_id)
            .bind(record.created_at);
        self.tracker.execute("appending event record", query).await?;
        Ok(())
    }

    async fn load_by_aggregate(
        &mut self,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, DomainError> {
        let query = sqlx::query_as::<_, EventRecordRow>(SELECT_BY_AGGREGATE).bind(aggregate_id);
        let rows = self.tracker.fetch_all("loading event records", query).await?;
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}

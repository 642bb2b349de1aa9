//! Quest repository on `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use questline_core::geo::{GeoCoordinate, GeoFence};
use questline_quest::domain::aggregates::{Quest, QuestRecord};
use questline_quest::domain::repository::QuestRepository;
use questline_quest::domain::status::QuestStatus;
use sqlx::FromRow;
use uuid::Uuid;

use super::PgTracker;

const SELECT_QUESTS: &str = r"
SELECT id, title, description, difficulty, reward, duration_minutes,
       target_latitude, target_longitude, execution_latitude, execution_longitude,
       equipment, skills, status, creator, assignee, created_at, updated_at
FROM quests";

const UPSERT_QUEST: &str = r"
INSERT INTO quests (
    id, title, description, difficulty, reward, duration_minutes,
    target_latitude, target_longitude, execution_latitude, execution_longitude,
    equipment, skills, status, creator, assignee, created_at, updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
ON CONFLICT (id) DO UPDATE SET
    title = EXCLUDED.title,
    description = EXCLUDED.description,
    difficulty = EXCLUDED.difficulty,
    reward = EXCLUDED.reward,
    duration_minutes = EXCLUDED.duration_minutes,
    target_latitude = EXCLUDED.target_latitude,
    target_longitude = EXCLUDED.target_longitude,
    execution_latitude = EXCLUDED.execution_latitude,
    execution_longitude = EXCLUDED.execution_longitude,
    equipment = EXCLUDED.equipment,
    skills = EXCLUDED.skills,
    status = EXCLUDED.status,
    assignee = EXCLUDED.assignee,
    updated_at = EXCLUDED.updated_at";

// $1..$4 are the box edges: min/max latitude, min/max longitude. A box whose
// min longitude exceeds its max wraps across the antimeridian.
const WITHIN_BOX: &str = r"
WHERE (target_latitude BETWEEN $1 AND $2
       AND (($3 <= $4 AND target_longitude BETWEEN $3 AND $4)
            OR ($3 > $4 AND (target_longitude >= $3 OR target_longitude <= $4))))
   OR (execution_latitude BETWEEN $1 AND $2
       AND (($3 <= $4 AND execution_longitude BETWEEN $3 AND $4)
            OR ($3 > $4 AND (execution_longitude >= $3 OR execution_longitude <= $4))))";

const ORDER: &str = " ORDER BY created_at, id";

#[derive(Debug, FromRow)]
struct QuestRow {
    id: Uuid,
    title: String,
    description: String,
    difficulty: String,
    reward: i64,
    duration_minutes: i64,
    target_latitude: f64,
    target_longitude: f64,
    execution_latitude: f64,
    execution_longitude: f64,
    equipment: Vec<String>,
    skills: Vec<String>,
    status: String,
    creator: String,
    assignee: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(id: Uuid, column: &str, err: impl Into<questline_core::error::BoxError>) -> DomainError {
    DomainError::infrastructure(format!("decoding quests.{column} of quest {id}"), err)
}

impl TryFrom<QuestRow> for Quest {
    type Error = DomainError;

    fn try_from(row: QuestRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let record = QuestRecord {
            id,
            title: row.title,
            description: row.description,
            difficulty: row.difficulty.parse().map_err(|err| corrupt(id, "difficulty", err))?,
            reward: u32::try_from(row.reward).map_err(|err| corrupt(id, "reward", err))?,
            duration_minutes: u32::try_from(row.duration_minutes)
                .map_err(|err| corrupt(id, "duration_minutes", err))?,
            target_location: GeoCoordinate::new(row.target_latitude, row.target_longitude)
                .map_err(|err| corrupt(id, "target_location", err))?,
            execution_location: GeoCoordinate::new(row.execution_latitude, row.execution_longitude)
                .map_err(|err| corrupt(id, "execution_location", err))?,
            equipment: row.equipment,
            skills: row.skills,
            status: row.status.parse().map_err(|err| corrupt(id, "status", err))?,
            creator: row.creator,
            assignee: row.assignee,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        Ok(Quest::restore(record))
    }
}

fn into_quests(rows: Vec<QuestRow>) -> Result<Vec<Quest>, DomainError> {
    rows.into_iter().map(Quest::try_from).collect()
}

/// Quest repository bound to a [`PgTracker`].
#[derive(Debug)]
pub struct PgQuestRepository<'a> {
    tracker: &'a mut PgTracker,
}

impl<'a> PgQuestRepository<'a> {
    pub(super) fn new(tracker: &'a mut PgTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl QuestRepository for PgQuestRepository<'_> {
    async fn save(&mut self, quest: &Quest) -> Result<(), DomainError> {
        let record = quest.record();
        let query = sqlx::query(UPSERT_QUEST)
            .bind(record.id)
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.difficulty.as_str())
            .bind(i64::from(record.reward))
            .bind(i64::from(record.duration_minutes))
            .bind(record.target_location.latitude())
            .bind(record.target_location.longitude())
            .bind(record.execution_location.latitude())
            .bind(record.execution_location.longitude())
            .bind(&record.equipment)
            .bind(&record.skills)
            .bind(record.status.as_str())
            .bind(&record.creator)
            .bind(&record.assignee)
            .bind(record.created_at)
            .bind(record.updated_at);
        self.tracker.execute("saving quest", query).await?;
        Ok(())
    }

    async fn get_by_id(&mut self, quest_id: Uuid) -> Result<Quest, DomainError> {
        let sql = format!("{SELECT_QUESTS} WHERE id = $1");
        let query = sqlx::query_as::<_, QuestRow>(&sql).bind(quest_id);
        self.tracker
            .fetch_optional("loading quest", query)
            .await?
            .ok_or(DomainError::AggregateNotFound(quest_id))
            .and_then(Quest::try_from)
    }

    async fn load_for_update(&mut self, quest_id: Uuid) -> Result<Quest, DomainError> {
        let sql = format!("{SELECT_QUESTS} WHERE id = $1 FOR UPDATE");
        let query = sqlx::query_as::<_, QuestRow>(&sql).bind(quest_id);
        self.tracker
            .fetch_optional("locking quest", query)
            .await?
            .ok_or(DomainError::AggregateNotFound(quest_id))
            .and_then(Quest::try_from)
    }

    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Quest>, DomainError> {
        let bounds = fence.bounds();
        let sql = format!("{SELECT_QUESTS}{WITHIN_BOX}{ORDER}");
        let query = sqlx::query_as::<_, QuestRow>(&sql)
            .bind(bounds.min_latitude)
            .bind(bounds.max_latitude)
            .bind(bounds.min_longitude)
            .bind(bounds.max_longitude);
        let candidates = into_quests(
            self.tracker
                .fetch_all("searching quests by location", query)
                .await?,
        )?;
        Ok(candidates
            .into_iter()
            .filter(|quest| quest.is_within(fence))
            .collect())
    }

    async fn find_by_assignee(&mut self, user_id: &str) -> Result<Vec<Quest>, DomainError> {
        let sql = format!("{SELECT_QUESTS} WHERE assignee = $1{ORDER}");
        let query = sqlx::query_as::<_, QuestRow>(&sql).bind(user_id);
        into_quests(
            self.tracker
                .fetch_all("listing quests by assignee", query)
                .await?,
        )
    }

    async fn find_by_status(&mut self, status: QuestStatus) -> Result<Vec<Quest>, DomainError> {
        let sql = format!("{SELECT_QUESTS} WHERE status = $1{ORDER}");
        let query = sqlx::query_as::<_, QuestRow>(&sql).bind(status.as_str());
        into_quests(
            self.tracker
                .fetch_all("listing quests by status", query)
                .await?,
        )
    }

    async fn find_all(&mut self) -> Result<Vec<Quest>, DomainError> {
        let sql = format!("{SELECT_QUESTS}{ORDER}");
        let query = sqlx::query_as::<_, QuestRow>(&sql);
        into_quests(self.tracker.fetch_all("listing quests", query).await?)
    }
}

//! Location repository on `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use questline_core::error::DomainError;
use questline_core::geo::{GeoCoordinate, GeoFence};
use questline_location::domain::aggregates::{Location, LocationRecord};
use questline_location::domain::repository::LocationRepository;
use sqlx::FromRow;
use uuid::Uuid;

use super::PgTracker;

const SELECT_LOCATIONS: &str = r"
SELECT id, name, description, latitude, longitude, address, created_at, updated_at
FROM locations";

const UPSERT_LOCATION: &str = r"
INSERT INTO locations (id, name, description, latitude, longitude, address, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (id) DO UPDATE SET
    name = EXCLUDED.name,
    description = EXCLUDED.description,
    latitude = EXCLUDED.latitude,
    longitude = EXCLUDED.longitude,
    address = EXCLUDED.address,
    updated_at = EXCLUDED.updated_at";

const WITHIN_BOX: &str = r"
WHERE latitude BETWEEN $1 AND $2
  AND (($3 <= $4 AND longitude BETWEEN $3 AND $4)
       OR ($3 > $4 AND (longitude >= $3 OR longitude <= $4)))";

const ORDER: &str = " ORDER BY created_at, id";

#[derive(Debug, FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    description: String,
    latitude: f64,
    longitude: f64,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = DomainError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let coordinate = GeoCoordinate::new(row.latitude, row.longitude).map_err(|err| {
            DomainError::infrastructure(format!("decoding coordinate of location {}", row.id), err)
        })?;
        Ok(Location::restore(LocationRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            coordinate,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

fn into_locations(rows: Vec<LocationRow>) -> Result<Vec<Location>, DomainError> {
    rows.into_iter().map(Location::try_from).collect()
}

/// Location repository bound to a [`PgTracker`].
#[derive(Debug)]
pub struct PgLocationRepository<'a> {
    tracker: &'a mut PgTracker,
}

impl<'a> PgLocationRepository<'a> {
    pub(super) fn new(tracker: &'a mut PgTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository<'_> {
    async fn save(&mut self, location: &Location) -> Result<(), DomainError> {
        let record = location.record();
        let query = sqlx::query(UPSERT_LOCATION)
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.coordinate.latitude())
            .bind(record.coordinate.longitude())
            .bind(&record.address)
            .bind(record.created_at)
            .bind(record.updated_at);
        self.tracker.execute("saving location", query).await?;
        Ok(())
    }

    async fn get_by_id(&mut self, location_id: Uuid) -> Result<Location, DomainError> {
        let sql = format!("{SELECT_LOCATIONS} WHERE id = $1");
        let query = sqlx::query_as::<_, LocationRow>(&sql).bind(location_id);
        self.tracker
            .fetch_optional("loading location", query)
            .await?
            .ok_or(DomainError::AggregateNotFound(location_id))
            .and_then(Location::try_from)
    }

    async fn find_by_location(&mut self, fence: &GeoFence) -> Result<Vec<Location>, DomainError> {
        let bounds = fence.bounds();
        let sql = format!("{SELECT_LOCATIONS}{WITHIN_BOX}{ORDER}");
        let query = sqlx::query_as::<_, LocationRow>(&sql)
            .bind(bounds.min_latitude)
            .bind(bounds.max_latitude)
            .bind(bounds.min_longitude)
            .bind(bounds.max_longitude);
        let candidates = into_locations(
            self.tracker
                .fetch_all("searching locations by location", query)
                .await?,
        )?;
        Ok(candidates
            .into_iter()
            .filter(|location| location.is_within(fence))
            .collect())
    }

    async fn find_all(&mut self) -> Result<Vec<Location>, DomainError> {
        let sql = format!("{SELECT_LOCATIONS}{ORDER}");
        let query = sqlx::query_as::<_, LocationRow>(&sql);
        into_locations(self.tracker.fetch_all("listing locations", query).await?)
    }
}

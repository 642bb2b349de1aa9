//! `PostgreSQL` store.
//!
//! A [`PgTracker`] holds at most one `sqlx` transaction. Repositories borrow
//! the tracker and run every statement on that transaction when one is
//! open, or straight on the pool otherwise. Every statement goes through the
//! tracker's [`OperationContext`], so cancellation drops the in-flight query
//! and with it the transaction, which `PostgreSQL` then rolls back.

mod events;
mod locations;
mod quests;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use questline_core::context::OperationContext;
use questline_core::error::DomainError;
use questline_core::unit_of_work::{EventRecordRepository, Tracker};
use questline_location::domain::repository::{LocationRepository, LocationUnitOfWork};
use questline_quest::domain::repository::{QuestRepository, QuestUnitOfWork};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

pub use events::PgEventRecordRepository;
pub use locations::PgLocationRepository;
pub use quests::PgQuestRepository;

/// PostgreSQL-backed store handing out [`PgTracker`]s.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    permits: Arc<Semaphore>,
}

impl PgStore {
    /// Creates a store over `pool`.
    #[must_use]
    pub fn new(pool: PgPool, config: StoreConfig) -> Self {
        Self {
            pool,
            permits: Arc::new(Semaphore::new(config.max_concurrent_units.get())),
        }
    }

    /// The underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns the migration error reported by `sqlx`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// A tracker working for `ctx`, with no open transaction.
    #[must_use]
    pub fn tracker(&self, ctx: OperationContext) -> PgTracker {
        PgTracker {
            pool: self.pool.clone(),
            permits: Arc::clone(&self.permits),
            ctx,
            tx: None,
            permit: None,
        }
    }
}

impl UnitOfWorkFactory for PgStore {
    fn unit_of_work(&self, ctx: OperationContext) -> Box<dyn UnitOfWork> {
        Box::new(self.tracker(ctx))
    }
}

/// Unit of work over a [`PgStore`].
pub struct PgTracker {
    pool: PgPool,
    permits: Arc<Semaphore>,
    ctx: OperationContext,
    tx: Option<Transaction<'static, Postgres>>,
    permit: Option<OwnedSemaphorePermit>,
}

impl fmt::Debug for PgTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTracker")
            .field("ctx", &self.ctx)
            .field("in_tx", &self.tx.is_some())
            .finish_non_exhaustive()
    }
}

fn database_error(what: &str, err: sqlx::Error) -> DomainError {
    DomainError::infrastructure(what.to_owned(), err)
}

impl PgTracker {
    /// The open transaction, for statements outside the repositories.
    pub fn tx(&mut self) -> Option<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut()
    }

    async fn execute(
        &mut self,
        what: &str,
        query: Query<'_, Postgres, PgArguments>,
    ) -> Result<u64, DomainError> {
        let Self { ctx, pool, tx, .. } = self;
        ctx.run(what, async move {
            let result = match tx.as_mut() {
                Some(tx) => query.execute(&mut **tx).await,
                None => query.execute(&*pool).await,
            };
            result
                .map(|done| done.rows_affected())
                .map_err(|err| database_error(what, err))
        })
        .await
    }

    async fn fetch_all<O>(
        &mut self,
        what: &str,
        query: QueryAs<'_, Postgres, O, PgArguments>,
    ) -> Result<Vec<O>, DomainError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let Self { ctx, pool, tx, .. } = self;
        ctx.run(what, async move {
            let result = match tx.as_mut() {
                Some(tx) => query.fetch_all(&mut **tx).await,
                None => query.fetch_all(&*pool).await,
            };
            result.map_err(|err| database_error(what, err))
        })
        .await
    }

    async fn fetch_optional<O>(
        &mut self,
        what: &str,
        query: QueryAs<'_, Postgres, O, PgArguments>,
    ) -> Result<Option<O>, DomainError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let Self { ctx, pool, tx, .. } = self;
        ctx.run(what, async move {
            let result = match tx.as_mut() {
                Some(tx) => query.fetch_optional(&mut **tx).await,
                None => query.fetch_optional(&*pool).await,
            };
            result.map_err(|err| database_error(what, err))
        })
        .await
    }
}

#[async_trait]
impl Tracker for PgTracker {
    async fn begin(&mut self) -> Result<(), DomainError> {
        if self.tx.is_some() {
            return Err(DomainError::Precondition(
                "transaction already open".to_owned(),
            ));
        }

        let permits = Arc::clone(&self.permits);
        let permit = self
            .ctx
            .run("waiting for a transaction slot", async move {
                permits
                    .acquire_owned()
                    .await
                    .map_err(|err| DomainError::infrastructure("acquiring transaction slot", err))
            })
            .await?;

        let pool = self.pool.clone();
        let tx = self
            .ctx
            .run("beginning transaction", async move {
                pool.begin()
                    .await
                    .map_err(|err| database_error("beginning transaction", err))
            })
            .await?;

        self.tx = Some(tx);
        self.permit = Some(permit);
        debug!("transaction opened");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let tx = self.tx.take();
        let _permit = self.permit.take();
        let tx = tx.ok_or_else(|| DomainError::Precondition("no open transaction".to_owned()))?;

        self.ctx
            .run("committing transaction", async move {
                tx.commit()
                    .await
                    .map_err(|err| database_error("committing transaction", err))
            })
            .await?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) {
        let _permit = self.permit.take();
        if let Some(tx) = self.tx.take() {
            match tx.rollback().await {
                Ok(()) => debug!("transaction rolled back"),
                Err(err) => warn!(error = %err, "transaction rollback failed"),
            }
        }
    }

    fn in_tx(&self) -> bool {
        self.tx.is_some()
    }

    fn context(&self) -> &OperationContext {
        &self.ctx
    }

    fn event_records(&mut self) -> Box<dyn EventRecordRepository + '_> {
        Box::new(PgEventRecordRepository::new(self))
    }
}

impl QuestUnitOfWork for PgTracker {
    fn quest_repository(&mut self) -> Box<dyn QuestRepository + '_> {
        Box::new(PgQuestRepository::new(self))
    }
}

impl LocationUnitOfWork for PgTracker {
    fn location_repository(&mut self) -> Box<dyn LocationRepository + '_> {
        Box::new(PgLocationRepository::new(self))
    }
}

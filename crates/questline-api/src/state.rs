//! Shared application state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use questline_core::clock::Clock;
use questline_core::context::OperationContext;
use questline_core::outbox::EventPublisher;
use questline_store::{UnitOfWork, UnitOfWorkFactory};
use tokio_util::sync::CancellationToken;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Source of per-request units of work.
    pub units: Arc<dyn UnitOfWorkFactory>,
    /// Clock stamped onto aggregates and events.
    pub clock: Arc<dyn Clock>,
    /// Outbox publisher shared by every command.
    pub publisher: EventPublisher,
    /// Deadline given to each request's unit of work.
    pub operation_timeout: Duration,
    /// Cancelled when the server is shutting down.
    pub shutdown: CancellationToken,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("operation_timeout", &self.operation_timeout)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        units: Arc<dyn UnitOfWorkFactory>,
        clock: Arc<dyn Clock>,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            units,
            clock,
            publisher: EventPublisher::new(),
            operation_timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// Ties every unit of work to `shutdown`.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// A fresh unit of work for one request, expiring after the operation
    /// timeout or when the server shuts down.
    #[must_use]
    pub fn unit_of_work(&self) -> Box<dyn UnitOfWork> {
        let ctx = OperationContext::with_timeout(self.operation_timeout)
            .with_cancellation(self.shutdown.child_token());
        self.units.unit_of_work(ctx)
    }
}

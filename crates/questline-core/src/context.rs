//! Per-operation cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DomainError;

/// Cancellation signal and optional deadline for one logical operation.
///
/// Every blocking store call made on behalf of the operation goes through
/// [`OperationContext::run`], so a cancelled or expired operation aborts the
/// in-flight call instead of completing the write.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Replaces the cancellation token, e.g. with a child of a shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that cancels this operation.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails fast if the operation is already cancelled or expired.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Cancelled`.
    pub fn ensure_active(&self, what: &str) -> Result<(), DomainError> {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled(format!("{what}: cancelled")));
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(DomainError::Cancelled(format!("{what}: deadline exceeded")));
        }
        Ok(())
    }

    /// Runs `call`, aborting it when the operation is cancelled or its
    /// deadline passes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Cancelled` on cancellation or expiry, otherwise
    /// whatever `call` returns.
    pub async fn run<T, F>(&self, what: &str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        self.ensure_active(what)?;

        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(DomainError::Cancelled(format!("{what}: cancelled"))),
            () = expiry => Err(DomainError::Cancelled(format!("{what}: deadline exceeded"))),
            result = call => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_call_result_when_active() {
        let ctx = OperationContext::background();

        let value = ctx.run("answer", async { Ok(42) }).await.unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_fails_when_already_cancelled() {
        // Arrange
        let ctx = OperationContext::background();
        ctx.cancellation_token().cancel();

        // Act
        let result = ctx.run("insert", async { Ok(()) }).await;

        // Assert
        match result.unwrap_err() {
            DomainError::Cancelled(msg) => assert_eq!(msg, "insert: cancelled"),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_call_at_deadline() {
        // Arrange
        let ctx = OperationContext::with_timeout(Duration::from_millis(50));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        };

        // Act
        let result = ctx.run("commit", slow).await;

        // Assert
        match result.unwrap_err() {
            DomainError::Cancelled(msg) => assert_eq!(msg, "commit: deadline exceeded"),
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }
}

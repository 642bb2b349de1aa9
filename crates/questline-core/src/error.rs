//! Domain error types.

use std::error::Error as StdError;

use thiserror::Error;
use uuid::Uuid;

/// Boxed underlying cause carried by infrastructure errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Malformed input or a violated field-level invariant.
    #[error("validation error on {field}: {reason}")]
    Validation {
        /// Name of the first invalid field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The aggregate is not in a state that permits the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A store or transport failure. The original cause is kept as the
    /// error source.
    #[error("infrastructure error: {context}")]
    Infrastructure {
        /// What was being attempted.
        context: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// A caller broke the unit-of-work protocol (e.g. commit without begin).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The operation was cancelled or ran past its deadline.
    #[error("operation cancelled: {0}")]
    Cancelled(String),
}

impl DomainError {
    /// Builds a validation error for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a low-level failure with context.
    pub fn infrastructure(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Infrastructure {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Prefixes the field of a validation error with `parent`, so a
    /// coordinate failure reads as `target_location.latitude`. Other
    /// variants pass through untouched.
    #[must_use]
    pub fn in_field(self, parent: &str) -> Self {
        match self {
            Self::Validation { field, reason } => Self::Validation {
                field: format!("{parent}.{field}"),
                reason,
            },
            other => other,
        }
    }

    /// Returns `true` for failures a client caused and can fix.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::AggregateNotFound(_) | Self::InvalidState(_)
        )
    }
}

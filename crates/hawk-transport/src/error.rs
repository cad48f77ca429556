//! Transport error types.

use thiserror::Error;

use hawk_core::{BackendError, ValidationError};

/// Errors reported for a submitted record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("queue full, non-priority record dropped")]
    Backpressure,

    #[error("queue is shut down")]
    Closed,

    #[error("install not identified: {0}")]
    NotIdentified(String),

    #[error("delivery failed: {0}")]
    Delivery(#[from] BackendError),
}

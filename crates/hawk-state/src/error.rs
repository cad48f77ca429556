//! Error types for the state store.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("cannot open state database: {0}")]
    Open(String),

    /// redb failed to begin, read, write or commit.
    #[error("state database error: {0}")]
    Storage(String),

    #[error("cannot encode {record}: {reason}")]
    Encode { record: &'static str, reason: String },

    /// A stored row no longer decodes, e.g. after a format change.
    #[error("stored {record} is unreadable: {reason}")]
    Corrupt { record: &'static str, reason: String },
}

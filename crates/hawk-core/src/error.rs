//! Caller-input validation errors.

use thiserror::Error;

/// Malformed caller input. Never sent to the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("tag key cannot be empty")]
    EmptyKey,

    #[error("tag value for key {0} cannot be empty")]
    EmptyValue(String),

    #[error("numeric value for key {0} is not finite")]
    NonFinite(String),

    #[error("page name cannot be empty")]
    EmptyPage,

    #[error("payload does not match code {code}: {reason}")]
    PayloadMismatch { code: u32, reason: String },

    #[error("friendly name cannot be empty")]
    EmptyFriendlyName,

    #[error("view class cannot be empty for friendly name {0}")]
    EmptyViewClass(String),

    #[error("{} friendly-name entries failed validation", .0.len())]
    InvalidEntries(Vec<ValidationError>),

    #[error("feedback needs a title or content")]
    EmptyFeedback,
}

//! Deep-link resolution errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("malformed url: {0}")]
    Malformed(String),

    #[error("url scheme {found} does not match {expected}")]
    SchemeMismatch { expected: String, found: String },

    #[error("unsupported command {0:?}")]
    CommandMismatch(String),

    #[error("launch url has no vc parameter")]
    MissingViewClass,
}

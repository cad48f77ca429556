//! Backend contract: The network collaborator behind install and log calls.
//!
//! Implementations are injected so tests can substitute an in-process fake.
//! `hawk-transport` ships the HTTP implementation.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::feedback::Feedback;
use crate::install::{InstallId, InstallRequest};
use crate::record::LogRecord;

pub type BackendFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Network or server failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("server rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// Remote operations the coordinator depends on.
pub trait Backend: Send + Sync {
    /// Create an install and return the server-assigned id.
    fn register_install<'a>(&'a self, request: &'a InstallRequest) -> BackendFuture<'a, InstallId>;

    /// Update mutable attributes of an existing install.
    fn update_install<'a>(
        &'a self,
        install_id: &'a str,
        request: &'a InstallRequest,
    ) -> BackendFuture<'a, ()>;

    /// Deliver a batch of log records for an install.
    fn post_logs<'a>(&'a self, install_id: &'a str, records: &'a [LogRecord])
        -> BackendFuture<'a, ()>;

    /// Submit user feedback on behalf of an install.
    fn submit_feedback<'a>(&'a self, install_id: &'a str, feedback: &'a Feedback)
        -> BackendFuture<'a, ()>;
}

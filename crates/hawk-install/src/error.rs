//! Install lifecycle error types.

use thiserror::Error;

/// Errors that can occur during install create/update.
#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("install registration failed: {0}")]
    Registration(#[source] hawk_core::BackendError),

    #[error("install update failed: {0}")]
    Update(#[source] hawk_core::BackendError),

    #[error("server returned an empty install id")]
    EmptyInstallId,
}

pub type InstallResult<T> = Result<T, InstallError>;

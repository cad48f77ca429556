//! SDK error types.

use thiserror::Error;

use hawk_core::ValidationError;
use hawk_deeplink::ResolveError;
use hawk_install::InstallError;
use hawk_state::StateError;
use hawk_transport::TransportError;

pub type HawkResult<T> = Result<T, HawkError>;

#[derive(Debug, Error)]
pub enum HawkError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("state store error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

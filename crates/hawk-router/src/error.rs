//! Routing errors.

use thiserror::Error;

use hawk_deeplink::ResolveError;
use hawk_transport::TransportError;

use crate::presenter::PresentError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("notification has no code")]
    MissingCode,

    #[error("notification code is not numeric: {0}")]
    MalformedCode(String),

    #[error("unknown notification code {0}")]
    UnknownCode(u32),

    #[error("action {action:?} is not recognized for code {code}")]
    UnknownAction { code: u32, action: String },

    #[error("code {0} requires a data field")]
    MissingData(u32),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Present(#[from] PresentError),

    #[error("open-url handler declined {0}")]
    UrlNotHandled(String),

    #[error("feedback not delivered: {0}")]
    Feedback(TransportError),
}

impl RouteError {
    /// Classification failures end in `Ignored` rather than `Routed`.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            RouteError::MissingCode
                | RouteError::MalformedCode(_)
                | RouteError::UnknownCode(_)
                | RouteError::UnknownAction { .. }
        )
    }
}

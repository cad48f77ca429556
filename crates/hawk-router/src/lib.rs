//! hawk-router: Inbound notification routing.
//!
//! # State machine
//!
//! ```text
//! Received ──classify──▶ Classified ──route──▶ Routed ──┐
//!     │                       │                         ├──▶ Completed
//!     └── bad code/action ────┴──────────────▶ Ignored ─┘
//! ```
//!
//! Every path ends in `Completed`, where the platform completion (if any)
//! is consumed exactly once. A context dropped mid-route reports `Failed`
//! through the token's drop guard.

pub mod codes;
pub mod context;
pub mod error;
pub mod presenter;
pub mod router;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use codes::{PushAction, PushCode};
pub use context::{AppState, NotificationContext};
pub use error::RouteError;
pub use presenter::{
    LoggingPresenter, OpenUrlHandler, PresentError, Presenter, PresenterFuture, Prompt,
};
pub use router::{NotificationRouter, RouteOutcome, RouteState};

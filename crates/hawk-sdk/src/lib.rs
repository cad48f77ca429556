//! hawk-sdk: Install lifecycle and event coordinator.
//!
//! [`HawkApp`] is the one context object a host application creates at
//! startup. It owns every component and exposes the public surface:
//! tags, page traces, deep links, notifications and regular tasks.
//!
//! # Architecture
//!
//! ```text
//!  host app ──▶ HawkApp
//!                 ├── tags / page trace ──────────────▶ EventQueue ──▶ Backend::post_logs
//!                 ├── regular_task() ─▶ RegularTaskScheduler ─┘   │
//!                 ├── handle_notification() ─▶ NotificationRouter ─┤
//!                 │                               └─▶ DeepLinkResolver ─▶ Presenter
//!                 ├── open_url() ─────────────────────▶ DeepLinkResolver ─▶ Presenter
//!                 ├── send_feedback() ─▶ FeedbackSender ─▶ Backend::submit_feedback
//!                 └── set_push_token() ─▶ InstallManager ◀── (identity for delivery)
//!                                              └─▶ Backend::register/update_install
//! ```
//!
//! ```no_run
//! # async fn demo() -> hawk_sdk::HawkResult<()> {
//! use hawk_sdk::{HawkApp, HawkConfig};
//!
//! let config = HawkConfig::scaffold("SHSample", "api.example.com:80");
//! let app = HawkApp::builder(config).start()?;
//! app.tag_string("a@a.com", "sh_email");
//! app.notify_page_enter("Home");
//! app.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod error;

pub use app::{HawkApp, HawkAppBuilder};
pub use error::{HawkError, HawkResult};

pub use hawk_core::{
    CompletionToken, EventAction, Feedback, FetchResult, FriendlyName, GeoPoint, HawkConfig,
    LaunchRequest, PushResult,
};
pub use hawk_router::{AppState, NotificationContext, OpenUrlHandler, Presenter, RouteOutcome};
pub use hawk_scheduler::{FixedLocation, LocationSource, NoLocation};

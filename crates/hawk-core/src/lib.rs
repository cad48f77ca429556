pub mod backend;
pub mod codec;
pub mod codes;
pub mod completion;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod feedback;
pub mod install;
pub mod record;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, BackendError, BackendFuture};
pub use codec::{EventAction, GeoPoint, PushResult};
pub use codes::LogCode;
pub use completion::{CompletionToken, FetchResult};
pub use config::HawkConfig;
pub use descriptor::{FriendlyName, LaunchRequest};
pub use error::ValidationError;
pub use feedback::Feedback;
pub use install::{Install, InstallChanges, InstallId, InstallPhase, InstallRequest};
pub use record::{LogRecord, Payload};

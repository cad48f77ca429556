//! Presenter contract: The host app's UI collaborator.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use hawk_core::{Feedback, LaunchRequest};

/// Application callback for URLs that are not launch commands. Returns
/// whether the app handled the URL.
pub type OpenUrlHandler = Arc<dyn Fn(&str) -> bool + Send + Sync>;

pub type PresenterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PresentError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("presentation failed: {0}")]
pub struct PresentError(pub String);

/// Title and body shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub title: Option<String>,
    pub message: Option<String>,
}

/// UI operations the router and the SDK delegate to the host app.
pub trait Presenter: Send + Sync {
    fn launch_view<'a>(&'a self, request: &'a LaunchRequest) -> PresenterFuture<'a, ()>;

    /// Open a URL that is not a launch command.
    fn open_url<'a>(&'a self, url: &'a str) -> PresenterFuture<'a, ()>;

    /// Ask the user for feedback. `None` if they dismissed the prompt.
    fn feedback_prompt<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, Option<Feedback>>;

    /// Ask the user whether to act on a notification received in the foreground.
    fn confirm<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, bool>;
}

/// Presenter for hosts without a UI. Logs every request and acts on
/// foreground notifications without asking. Feedback prompts are dismissed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPresenter;

impl Presenter for LoggingPresenter {
    fn launch_view<'a>(&'a self, request: &'a LaunchRequest) -> PresenterFuture<'a, ()> {
        Box::pin(async move {
            info!(
                view_class = %request.view_class,
                phone_resource = ?request.phone_resource,
                tablet_resource = ?request.tablet_resource,
                extras = ?request.extras,
                "launch view"
            );
            Ok(())
        })
    }

    fn open_url<'a>(&'a self, url: &'a str) -> PresenterFuture<'a, ()> {
        Box::pin(async move {
            info!(%url, "open url");
            Ok(())
        })
    }

    fn feedback_prompt<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, Option<Feedback>> {
        Box::pin(async move {
            info!(title = ?prompt.title, message = ?prompt.message, "feedback prompt, no one to answer");
            Ok(None)
        })
    }

    fn confirm<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, bool> {
        Box::pin(async move {
            info!(title = ?prompt.title, "auto-confirming notification");
            Ok(true)
        })
    }
}

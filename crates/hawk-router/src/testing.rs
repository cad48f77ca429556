//! Presenter fake for tests (feature `testing`).

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use hawk_core::{Feedback, LaunchRequest};

use crate::presenter::{PresentError, Presenter, PresenterFuture, Prompt};

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Launch(LaunchRequest),
    OpenUrl(String),
    Feedback(Prompt),
    Confirm(Prompt),
}

/// Records every UI request. Confirms with `true` and dismisses feedback
/// prompts unless told otherwise.
pub struct RecordingPresenter {
    calls: Mutex<Vec<PresenterCall>>,
    confirm_answer: AtomicBool,
    feedback_answer: Mutex<Option<Feedback>>,
    fail: AtomicBool,
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            confirm_answer: AtomicBool::new(true),
            feedback_answer: Mutex::new(None),
            fail: AtomicBool::new(false),
        }
    }
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_confirm(&self, answer: bool) {
        self.confirm_answer.store(answer, Ordering::SeqCst);
    }

    /// What the "user" types into the next feedback prompts.
    pub fn answer_feedback(&self, feedback: Option<Feedback>) {
        *self.feedback_answer.lock().unwrap() = feedback;
    }

    /// Make launch, open-url and feedback calls fail.
    pub fn fail_presentations(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PresenterCall::Launch(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PresenterCall) -> Result<(), PresentError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PresentError("injected failure".into()));
        }
        Ok(())
    }
}

impl Presenter for RecordingPresenter {
    fn launch_view<'a>(&'a self, request: &'a LaunchRequest) -> PresenterFuture<'a, ()> {
        Box::pin(async move { self.record(PresenterCall::Launch(request.clone())) })
    }

    fn open_url<'a>(&'a self, url: &'a str) -> PresenterFuture<'a, ()> {
        Box::pin(async move { self.record(PresenterCall::OpenUrl(url.to_string())) })
    }

    fn feedback_prompt<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, Option<Feedback>> {
        Box::pin(async move {
            self.record(PresenterCall::Feedback(prompt.clone()))?;
            Ok(self.feedback_answer.lock().unwrap().clone())
        })
    }

    fn confirm<'a>(&'a self, prompt: &'a Prompt) -> PresenterFuture<'a, bool> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(PresenterCall::Confirm(prompt.clone()));
            Ok(self.confirm_answer.load(Ordering::SeqCst))
        })
    }
}

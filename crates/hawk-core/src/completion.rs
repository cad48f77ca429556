//! Must-call-once completion tokens for platform callbacks.
//!
//! Background fetch and notification delivery hand us a completion handler
//! that has to be invoked exactly once. `CompletionToken::complete` consumes
//! the token, so a second call does not compile. A token dropped without
//! being completed reports `FetchResult::Failed` from its `Drop` impl.

use std::fmt;

use tracing::warn;

/// Tri-state result reported to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult {
    NewData,
    NoData,
    Failed,
}

type Callback = Box<dyn FnOnce(FetchResult) + Send>;

pub struct CompletionToken {
    callback: Option<Callback>,
}

impl CompletionToken {
    pub fn new(callback: impl FnOnce(FetchResult) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Invoke the callback with `result`.
    pub fn complete(mut self, result: FetchResult) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            warn!("completion token dropped without a result, reporting failure");
            callback(FetchResult::Failed);
        }
    }
}

impl fmt::Debug for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionToken")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording() -> (CompletionToken, Arc<Mutex<Vec<FetchResult>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let token = CompletionToken::new(move |r| sink.lock().unwrap().push(r));
        (token, calls)
    }

    #[test]
    fn complete_invokes_once() {
        let (token, calls) = recording();
        token.complete(FetchResult::NewData);
        assert_eq!(*calls.lock().unwrap(), vec![FetchResult::NewData]);
    }

    #[test]
    fn drop_reports_failure() {
        let (token, calls) = recording();
        drop(token);
        assert_eq!(*calls.lock().unwrap(), vec![FetchResult::Failed]);
    }
}

//! In-process backend fake for tests (feature `testing`).
//!
//! Records every call in arrival order, tracks the peak number of
//! concurrent in-flight calls, and can be told to fail upcoming calls.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{Backend, BackendError, BackendFuture};
use crate::completion::{CompletionToken, FetchResult};
use crate::feedback::Feedback;
use crate::install::{InstallId, InstallRequest};
use crate::record::LogRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Register(InstallRequest),
    Update {
        install_id: String,
        request: InstallRequest,
    },
    Logs {
        install_id: String,
        records: Vec<LogRecord>,
    },
    Feedback {
        install_id: String,
        feedback: Feedback,
    },
}

#[derive(Default)]
pub struct RecordingBackend {
    next_id: AtomicU64,
    calls: Mutex<Vec<BackendCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
    fail_registers: AtomicUsize,
    fail_updates: AtomicUsize,
    fail_logs: AtomicUsize,
    fail_feedback: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every call open for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_next_registers(&self, n: usize) {
        self.fail_registers.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_logs(&self, n: usize) {
        self.fail_logs.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_feedback(&self, n: usize) {
        self.fail_feedback.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn register_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Register(_)))
            .count()
    }

    pub fn updates(&self) -> Vec<InstallRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Update { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Every record posted, flattened in delivery order.
    pub fn logged_records(&self) -> Vec<LogRecord> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Logs { records, .. } => Some(records),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Feedback submissions with the install they were sent for.
    pub fn feedback(&self) -> Vec<(String, Feedback)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Feedback {
                    install_id,
                    feedback,
                } => Some((install_id, feedback)),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: BackendCall) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        guard
    }

    fn should_fail(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Backend for RecordingBackend {
    fn register_install<'a>(&'a self, request: &'a InstallRequest) -> BackendFuture<'a, InstallId> {
        Box::pin(async move {
            let _guard = self.enter(BackendCall::Register(request.clone())).await;
            if Self::should_fail(&self.fail_registers) {
                return Err(BackendError::Connect("injected failure".into()));
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("install-{n}"))
        })
    }

    fn update_install<'a>(
        &'a self,
        install_id: &'a str,
        request: &'a InstallRequest,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self
                .enter(BackendCall::Update {
                    install_id: install_id.to_string(),
                    request: request.clone(),
                })
                .await;
            if Self::should_fail(&self.fail_updates) {
                return Err(BackendError::Status {
                    status: 503,
                    body: "injected failure".into(),
                });
            }
            Ok(())
        })
    }

    fn post_logs<'a>(
        &'a self,
        install_id: &'a str,
        records: &'a [LogRecord],
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self
                .enter(BackendCall::Logs {
                    install_id: install_id.to_string(),
                    records: records.to_vec(),
                })
                .await;
            if Self::should_fail(&self.fail_logs) {
                return Err(BackendError::Timeout);
            }
            Ok(())
        })
    }

    fn submit_feedback<'a>(
        &'a self,
        install_id: &'a str,
        feedback: &'a Feedback,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self
                .enter(BackendCall::Feedback {
                    install_id: install_id.to_string(),
                    feedback: feedback.clone(),
                })
                .await;
            if Self::should_fail(&self.fail_feedback) {
                return Err(BackendError::Rejected {
                    code: 1,
                    message: "injected failure".into(),
                });
            }
            Ok(())
        })
    }
}

/// A completion token that records what it was completed with.
pub fn recording_completion() -> (CompletionToken, Arc<Mutex<Vec<FetchResult>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let token = CompletionToken::new(move |r| sink.lock().unwrap().push(r));
    (token, calls)
}

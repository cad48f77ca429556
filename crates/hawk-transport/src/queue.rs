//! EventQueue: Buffered, ordered delivery of log records.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hawk_core::config::{DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY};
use hawk_core::{Backend, HawkConfig, LogRecord};
use hawk_install::InstallManager;

use crate::error::TransportError;

type Outcome = Result<(), TransportError>;

/// Queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Buffered records beyond which non-priority submissions are rejected.
    pub capacity: usize,
    /// Maximum records per `post_logs` call.
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl QueueConfig {
    pub fn from_config(config: &HawkConfig) -> Self {
        Self {
            capacity: config.queue_capacity(),
            batch_size: config.batch_size(),
        }
    }
}

/// Delivery counters since the queue started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub delivered: u64,
    pub failed: u64,
    pub rejected: u64,
}

/// Handle to the eventual outcome of one submitted record.
///
/// Dropping it is fine; the record is still delivered.
#[derive(Debug)]
pub struct Delivery {
    rx: oneshot::Receiver<Outcome>,
}

impl Delivery {
    /// Wait until the record was transmitted or dropped.
    pub async fn outcome(self) -> Outcome {
        self.rx.await.unwrap_or(Err(TransportError::Closed))
    }
}

struct Pending {
    record: LogRecord,
    reply: oneshot::Sender<Outcome>,
}

struct Shared {
    buffer: Mutex<VecDeque<Pending>>,
    /// Set under the buffer lock, so the worker never exits with records queued.
    closed: AtomicBool,
    notify: Notify,
    config: QueueConfig,
    install: Arc<InstallManager>,
    backend: Arc<dyn Backend>,
    delivered: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Single-worker FIFO queue in front of `Backend::post_logs`.
pub struct EventQueue {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EventQueue {
    /// Start the queue and its worker task. Must be called inside a tokio runtime.
    pub fn start(
        config: QueueConfig,
        install: Arc<InstallManager>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
            config,
            install,
            backend,
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        });

        let worker = tokio::spawn(run_worker(shared.clone()));
        info!(
            capacity = config.capacity,
            batch_size = config.batch_size,
            "event queue started"
        );

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueue a record without waiting for delivery.
    pub fn submit(&self, record: LogRecord) -> Result<Delivery, TransportError> {
        record.validate()?;

        let (reply, rx) = oneshot::channel();
        {
            let mut buffer = self.shared.lock_buffer();
            if self.shared.closed.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            if !record.priority && buffer.len() >= self.shared.config.capacity {
                self.shared.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(code = %record.code, buffered = buffer.len(), "queue full, rejecting record");
                return Err(TransportError::Backpressure);
            }
            buffer.push_back(Pending { record, reply });
        }
        self.shared.notify.notify_one();

        Ok(Delivery { rx })
    }

    /// Enqueue a record and wait for its delivery outcome.
    pub async fn send(&self, record: LogRecord) -> Result<(), TransportError> {
        self.submit(record)?.outcome().await
    }

    /// Records waiting for the worker.
    pub fn pending(&self) -> usize {
        self.shared.lock_buffer().len()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            rejected: self.shared.rejected.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting records, deliver what is buffered, then stop the worker.
    pub async fn shutdown(&self) {
        self.shared.close();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "event queue worker ended abnormally");
        }
        info!(stats = ?self.stats(), "event queue stopped");
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        // Let the worker drain and exit on its own.
        self.shared.close();
    }
}

impl Shared {
    fn lock_buffer(&self) -> MutexGuard<'_, VecDeque<Pending>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        {
            let _buffer = self.lock_buffer();
            self.closed.store(true, Ordering::SeqCst);
        }
        self.notify.notify_one();
    }

    fn next_batch(&self) -> Option<Vec<Pending>> {
        let mut buffer = self.lock_buffer();
        if buffer.is_empty() {
            return None;
        }
        let n = buffer.len().min(self.config.batch_size.max(1));
        Some(buffer.drain(..n).collect())
    }

    fn is_finished(&self) -> bool {
        let buffer = self.lock_buffer();
        buffer.is_empty() && self.closed.load(Ordering::SeqCst)
    }

    async fn deliver(&self, batch: Vec<Pending>) {
        let (records, replies): (Vec<_>, Vec<_>) =
            batch.into_iter().map(|p| (p.record, p.reply)).unzip();
        let count = records.len() as u64;

        let outcome = match self.install.ensure_install().await {
            Ok(install_id) => self
                .backend
                .post_logs(&install_id, &records)
                .await
                .map_err(TransportError::from),
            Err(e) => Err(TransportError::NotIdentified(e.to_string())),
        };

        match &outcome {
            Ok(()) => {
                self.delivered.fetch_add(count, Ordering::Relaxed);
                debug!(count, "log batch delivered");
            }
            Err(e) => {
                self.failed.fetch_add(count, Ordering::Relaxed);
                let priority = records.iter().filter(|r| r.priority).count();
                warn!(count, priority, error = %e, "log batch dropped");
            }
        }

        for reply in replies {
            let _ = reply.send(outcome.clone());
        }
    }
}

async fn run_worker(shared: Arc<Shared>) {
    loop {
        match shared.next_batch() {
            Some(batch) => shared.deliver(batch).await,
            None if shared.is_finished() => break,
            None => shared.notify.notified().await,
        }
    }
    debug!("event queue worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hawk_core::testing::{BackendCall, RecordingBackend};
    use hawk_core::{EventAction, LogCode};

    fn start(backend: &Arc<RecordingBackend>, config: QueueConfig) -> EventQueue {
        let install = Arc::new(InstallManager::new("SHSample", backend.clone()));
        EventQueue::start(config, install, backend.clone())
    }

    fn page(name: &str) -> LogRecord {
        EventAction::PageEnter {
            page: name.to_string(),
        }
        .encode(Utc::now())
        .unwrap()
    }

    fn heartbeat() -> LogRecord {
        EventAction::Heartbeat.encode(Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn records_are_delivered_in_submission_order() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(&backend, QueueConfig::default());

        let deliveries: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|p| queue.submit(page(p)).unwrap())
            .collect();
        for d in deliveries {
            d.outcome().await.unwrap();
        }

        let pages: Vec<_> = backend
            .logged_records()
            .iter()
            .map(|r| r.attributes["page"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(pages, vec!["a", "b", "c", "d"]);
        assert_eq!(queue.stats().delivered, 4);
    }

    #[tokio::test]
    async fn identity_is_resolved_before_transmission() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(&backend, QueueConfig::default());

        queue.send(page("home")).await.unwrap();

        let calls = backend.calls();
        assert!(matches!(calls[0], BackendCall::Register(_)));
        assert!(matches!(
            &calls[1],
            BackendCall::Logs { install_id, .. } if install_id == "install-1"
        ));
    }

    #[tokio::test]
    async fn failed_identification_surfaces_not_identified() {
        let backend = Arc::new(RecordingBackend::new());
        backend.fail_next_registers(1);
        let queue = start(&backend, QueueConfig::default());

        let err = queue.send(page("home")).await.unwrap_err();
        assert!(matches!(err, TransportError::NotIdentified(_)));
        assert!(backend.logged_records().is_empty());
        assert_eq!(queue.stats().failed, 1);
    }

    #[tokio::test]
    async fn non_priority_records_are_rejected_when_full() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(
            &backend,
            QueueConfig {
                capacity: 2,
                batch_size: 10,
            },
        );

        // The worker has not run yet on this single-threaded runtime.
        let a = queue.submit(page("a")).unwrap();
        let b = queue.submit(page("b")).unwrap();
        assert_eq!(
            queue.submit(page("c")).unwrap_err(),
            TransportError::Backpressure
        );
        let hb = queue.submit(heartbeat()).unwrap();
        assert_eq!(queue.pending(), 3);

        a.outcome().await.unwrap();
        b.outcome().await.unwrap();
        hb.outcome().await.unwrap();
        assert_eq!(backend.logged_records().len(), 3);
        assert_eq!(queue.stats().rejected, 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_not_retried_for_either_class() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(&backend, QueueConfig::default());
        queue.send(page("warmup")).await.unwrap();

        backend.fail_next_logs(1);
        let err = queue.send(heartbeat()).await.unwrap_err();
        assert!(matches!(err, TransportError::Delivery(_)));

        backend.fail_next_logs(1);
        assert!(queue.send(page("lost")).await.is_err());

        queue.send(page("after")).await.unwrap();

        let codes: Vec<_> = backend.logged_records().iter().map(|r| r.code).collect();
        assert_eq!(
            codes,
            vec![
                LogCode::PageEnter,
                LogCode::Heartbeat,
                LogCode::PageEnter,
                LogCode::PageEnter
            ],
            "each record is posted exactly once, failures are not replayed"
        );
    }

    #[tokio::test]
    async fn invalid_record_is_rejected_synchronously() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(&backend, QueueConfig::default());

        let record = LogRecord::new(LogCode::TagRemove, Utc::now());
        let err = queue.submit(record).unwrap_err();
        assert!(matches!(err, TransportError::Validation(_)));
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(
            &backend,
            QueueConfig {
                capacity: 100,
                batch_size: 2,
            },
        );

        let deliveries: Vec<_> = (0..5)
            .map(|i| queue.submit(page(&format!("p{i}"))).unwrap())
            .collect();
        for d in deliveries {
            d.outcome().await.unwrap();
        }

        let batches: Vec<usize> = backend
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Logs { records, .. } => Some(records.len()),
                _ => None,
            })
            .collect();
        assert_eq!(batches, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn shutdown_drains_then_rejects() {
        let backend = Arc::new(RecordingBackend::new());
        let queue = start(&backend, QueueConfig::default());

        let d = queue.submit(page("last")).unwrap();
        queue.shutdown().await;
        d.outcome().await.unwrap();

        assert_eq!(
            queue.submit(page("late")).unwrap_err(),
            TransportError::Closed
        );
        assert_eq!(backend.logged_records().len(), 1);
    }
}

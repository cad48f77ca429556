//! hawk-transport: Delivery of coded log records.
//!
//! # Architecture
//!
//! ```text
//! producers ──submit()──▶ EventQueue buffer (single FIFO)
//!                              │
//!                         worker task
//!                              ├── InstallManager::ensure_install()
//!                              └── Backend::post_logs(batch)
//! ```
//!
//! Priority records are always admitted. Non-priority records are rejected
//! once the buffer reaches capacity. A single worker drains the buffer in
//! order, so records from one producer reach the backend in submission order.
//!
//! Delivery is at-most-once for both classes: a failed batch is reported
//! to each submitter's `Delivery` handle and dropped.
//!
//! User feedback skips the buffer: `FeedbackSender` submits it directly and
//! returns the backend's answer.

pub mod error;
pub mod feedback;
pub mod http;
pub mod queue;

pub use error::TransportError;
pub use feedback::FeedbackSender;
pub use http::HttpBackend;
pub use queue::{Delivery, EventQueue, QueueConfig, QueueStats};

//! hawk-scheduler: Regular tasks run on externally triggered wake-ups.
//!
//! # Architecture
//!
//! ```text
//! platform wake-up / tick loop
//!         │
//!  RegularTaskScheduler::run_scheduled_tasks(completion)
//!         ├── location ping  (1h, needs location enabled + fix)
//!         └── heartbeat      (6h, priority)
//!                │
//!     TaskTimers::try_fire()   (atomic check-and-update of last fired time)
//!                │
//!         EventQueue::submit()
//! ```
//!
//! The completion is invoked once per invocation, right after dispatch.
//! It does not wait for the backend.

pub mod clock;
pub mod location;
pub mod scheduler;
pub mod timers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use location::{FixedLocation, LocationSource, NoLocation};
pub use scheduler::{RegularTaskScheduler, TaskIntervals};
pub use timers::{RegularTask, TaskTimers};

//! hawk-install: Install lifecycle management.
//!
//! Owns the single install identity of the process. Every create or update
//! call goes through a [`FifoGate`], so the backend never sees two
//! concurrent install requests from one device and requests complete in
//! arrival order.
//!
//! # Architecture
//!
//! ```text
//! InstallManager
//!   ├── FifoGate (one holder, explicit FIFO wait list)
//!   ├── Install (local mirror, written only by the gate holder)
//!   ├── Backend (register_install / update_install)
//!   └── Optional StateStore (persist identified install)
//! ```
//!
//! Local state changes only after the holder's network call succeeds.
//! There is no retry loop here; callers re-invoke on failure.

pub mod error;
pub mod gate;
pub mod manager;

pub use error::{InstallError, InstallResult};
pub use gate::{FifoGate, GatePermit};
pub use manager::InstallManager;

//! hawk-state: Embedded state store for the install coordinator.
//!
//! Backed by [redb](https://docs.rs/redb), persists the identified install
//! record and the regular-task timer entries so that identity and
//! last-fired times survive a process restart.
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. The
//! `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::TaskTimerEntry;

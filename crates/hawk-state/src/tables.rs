//! redb table definitions.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized types).

use redb::TableDefinition;

/// The single install record, keyed by [`INSTALL_KEY`].
pub const INSTALL: TableDefinition<&str, &[u8]> = TableDefinition::new("install");

/// Regular-task timer entries keyed by task id.
pub const TASK_TIMERS: TableDefinition<&str, &[u8]> = TableDefinition::new("task_timers");

pub const INSTALL_KEY: &str = "current";

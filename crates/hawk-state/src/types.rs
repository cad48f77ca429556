//! Persisted record types owned by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last time a regular task fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTimerEntry {
    pub task: String,
    pub last_fired_at: DateTime<Utc>,
}

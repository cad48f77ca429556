//! Minimum-interval timers for the regular tasks.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use hawk_state::{StateStore, TaskTimerEntry};

/// The periodic tasks the scheduler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegularTask {
    LocationPing,
    Heartbeat,
}

impl RegularTask {
    /// Dispatch order within one invocation.
    pub const ALL: [RegularTask; 2] = [RegularTask::LocationPing, RegularTask::Heartbeat];

    pub fn name(self) -> &'static str {
        match self {
            RegularTask::LocationPing => "location",
            RegularTask::Heartbeat => "heartbeat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for RegularTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Last-fired times, one per task, with an interval each.
pub struct TaskTimers {
    intervals: HashMap<RegularTask, TimeDelta>,
    last_fired: Mutex<HashMap<RegularTask, DateTime<Utc>>>,
    store: Option<StateStore>,
}

impl TaskTimers {
    pub fn new(intervals: impl IntoIterator<Item = (RegularTask, Duration)>) -> Self {
        Self {
            intervals: intervals
                .into_iter()
                .map(|(task, every)| (task, TimeDelta::from_std(every).unwrap_or(TimeDelta::MAX)))
                .collect(),
            last_fired: Mutex::new(HashMap::new()),
            store: None,
        }
    }

    /// Load persisted last-fired times and write future ones back.
    pub fn with_store(mut self, store: StateStore) -> Self {
        match store.list_task_timers() {
            Ok(entries) => {
                let mut last_fired = self.lock();
                for entry in entries {
                    match RegularTask::from_name(&entry.task) {
                        Some(task) => {
                            last_fired.insert(task, entry.last_fired_at);
                        }
                        None => debug!(task = %entry.task, "ignoring unknown stored timer"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to load task timers"),
        }
        self.store = Some(store);
        self
    }

    pub fn last_fired(&self, task: RegularTask) -> Option<DateTime<Utc>> {
        self.lock().get(&task).copied()
    }

    /// Whether `task` may fire at `now`, without recording anything.
    pub fn is_due(&self, task: RegularTask, now: DateTime<Utc>) -> bool {
        self.due(&self.lock(), task, now)
    }

    /// Atomically check the interval and, if elapsed, record `now` as the
    /// last fired time. Returns whether the task fired.
    pub fn try_fire(&self, task: RegularTask, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.lock();
        if !self.due(&last_fired, task, now) {
            return false;
        }
        last_fired.insert(task, now);
        drop(last_fired);

        if let Some(store) = &self.store {
            let entry = TaskTimerEntry {
                task: task.name().to_string(),
                last_fired_at: now,
            };
            if let Err(e) = store.put_task_timer(&entry) {
                warn!(%task, error = %e, "failed to persist task timer");
            }
        }
        true
    }

    fn due(
        &self,
        last_fired: &HashMap<RegularTask, DateTime<Utc>>,
        task: RegularTask,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(interval) = self.intervals.get(&task) else {
            return false;
        };
        match last_fired.get(&task) {
            Some(last) => now.signed_duration_since(*last) >= *interval,
            None => true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RegularTask, DateTime<Utc>>> {
        self.last_fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! RegularTaskScheduler: Dispatches due regular tasks to the event queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use hawk_core::config::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_LOCATION_INTERVAL};
use hawk_core::{CompletionToken, EventAction, FetchResult, HawkConfig};
use hawk_state::StateStore;
use hawk_transport::EventQueue;

use crate::clock::Clock;
use crate::location::LocationSource;
use crate::timers::{RegularTask, TaskTimers};

/// Minimum interval between two firings of each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskIntervals {
    pub location: Duration,
    pub heartbeat: Duration,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION_INTERVAL,
            heartbeat: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl TaskIntervals {
    pub fn from_config(config: &HawkConfig) -> Self {
        Self {
            location: config.location_interval(),
            heartbeat: config.heartbeat_interval(),
        }
    }
}

pub struct RegularTaskScheduler {
    timers: TaskTimers,
    queue: Arc<EventQueue>,
    location: Arc<dyn LocationSource>,
    clock: Arc<dyn Clock>,
}

impl RegularTaskScheduler {
    pub fn new(
        intervals: TaskIntervals,
        queue: Arc<EventQueue>,
        location: Arc<dyn LocationSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timers = TaskTimers::new([
            (RegularTask::LocationPing, intervals.location),
            (RegularTask::Heartbeat, intervals.heartbeat),
        ]);
        Self {
            timers,
            queue,
            location,
            clock,
        }
    }

    /// Persist last-fired times in `store`.
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.timers = self.timers.with_store(store);
        self
    }

    pub fn timers(&self) -> &TaskTimers {
        &self.timers
    }

    /// Run every due task once and report the outcome.
    ///
    /// With a store attached this commits a redb transaction per fired
    /// task, so async callers should go through [`run`](Self::run) or
    /// `spawn_blocking`.
    ///
    /// `completion`, when given, is completed exactly once after dispatch:
    /// `NewData` if at least one record was handed to the queue, `NoData`
    /// otherwise. Network responses are not awaited.
    pub fn run_scheduled_tasks(&self, completion: Option<CompletionToken>) -> FetchResult {
        let now = self.clock.now();
        let mut dispatched = Vec::new();

        for task in RegularTask::ALL {
            let Some(action) = self.prepare(task) else {
                continue;
            };
            if !self.timers.try_fire(task, now) {
                continue;
            }
            match action.encode(now) {
                Ok(record) => match self.queue.submit(record) {
                    Ok(_) => dispatched.push(task),
                    Err(e) => warn!(%task, error = %e, "regular task submission failed"),
                },
                Err(e) => warn!(%task, error = %e, "regular task produced an invalid record"),
            }
        }

        let result = if dispatched.is_empty() {
            FetchResult::NoData
        } else {
            FetchResult::NewData
        };
        debug!(?dispatched, ?result, "regular tasks run");

        if let Some(completion) = completion {
            completion.complete(result);
        }
        result
    }

    /// Run the regular tasks every `interval` until `shutdown` flips.
    ///
    /// The first run happens immediately. Each run goes to the blocking
    /// pool, since persisting a timer commits a redb write transaction.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "regular task loop started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let scheduler = self.clone();
                    let run = tokio::task::spawn_blocking(move || scheduler.run_scheduled_tasks(None));
                    if let Err(e) = run.await {
                        warn!(error = %e, "regular task run panicked");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("regular task loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// The record a task would emit now, or `None` if its preconditions fail.
    /// Preconditions are checked before the timer so a skipped task stays due.
    fn prepare(&self, task: RegularTask) -> Option<EventAction> {
        match task {
            RegularTask::LocationPing => {
                if !self.location.is_enabled() {
                    debug!("location disabled, skipping ping");
                    return None;
                }
                let Some(location) = self.location.current() else {
                    debug!("no location fix, skipping ping");
                    return None;
                };
                Some(EventAction::LocationPing { location })
            }
            RegularTask::Heartbeat => Some(EventAction::Heartbeat),
        }
    }
}

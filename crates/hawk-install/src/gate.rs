//! FIFO mutual-exclusion gate.
//!
//! At most one holder at a time. Waiters are kept in an explicit queue and
//! the permit is handed directly to the oldest waiter on release, so wake
//! order is arrival order by construction.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

#[derive(Default)]
struct GateState {
    held: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

#[derive(Default)]
pub struct FifoGate {
    state: Mutex<GateState>,
}

/// Proof of holding the gate. Released on drop.
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GatePermit<'a> {
    gate: &'a FifoGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// A queued acquire. If the acquiring future is dropped after the permit
/// was handed over but before it was observed, the permit is passed on.
struct Waiter<'a> {
    gate: &'a FifoGate,
    rx: Option<oneshot::Receiver<()>>,
}

impl Waiter<'_> {
    async fn wait(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            // The sender lives in the wait list until it is used to hand over.
            let _ = rx.await;
        }
        self.rx = None;
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                self.gate.release();
            }
        }
    }
}

impl FifoGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate. Callers are admitted in the order they arrive.
    pub async fn acquire(&self) -> GatePermit<'_> {
        let rx = {
            let mut state = self.lock();
            if !state.held {
                state.held = true;
                return GatePermit { gate: self };
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        let mut waiter = Waiter {
            gate: self,
            rx: Some(rx),
        };
        waiter.wait().await;
        GatePermit { gate: self }
    }

    /// Take the gate only if nobody holds it.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        let mut state = self.lock();
        if state.held {
            return None;
        }
        state.held = true;
        Some(GatePermit { gate: self })
    }

    pub fn is_held(&self) -> bool {
        self.lock().held
    }

    /// Number of callers waiting behind the current holder.
    pub fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    fn release(&self) {
        let mut state = self.lock();
        while let Some(tx) = state.waiters.pop_front() {
            if tx.send(()).is_ok() {
                // Ownership moves to the waiter; `held` stays true.
                return;
            }
        }
        state.held = false;
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Environment readiness gating.
//!
//! Queries may be built before the environment that should execute them is
//! fully wired (adapters still connecting, schema modules still loading).
//! A [`ReadyGate`] lets execution wait for an explicit readiness signal,
//! bounded by a timeout: a gate that never fires delays queries, it does
//! not wedge them.

use std::fmt;
use std::time::Duration;
use tokio::sync::watch;

/// One-way readiness signal with bounded waiting.
pub struct ReadyGate {
    sender: watch::Sender<bool>,
}

impl ReadyGate {
    /// A gate that starts ready (`true`) or deferred (`false`).
    pub fn new(ready: bool) -> Self {
        let (sender, _) = watch::channel(ready);
        Self { sender }
    }

    pub fn is_ready(&self) -> bool {
        *self.sender.borrow()
    }

    /// Fire the signal. All current and future waiters proceed. Firing an
    /// already-ready gate is a no-op.
    pub fn set_ready(&self) {
        self.sender.send_modify(|ready| *ready = true);
    }

    /// Wait until the gate is ready, at most `limit`. On timeout, log a
    /// warning and return anyway.
    pub async fn wait(&self, limit: Duration) {
        if self.is_ready() {
            return;
        }
        let mut receiver = self.sender.subscribe();
        match tokio::time::timeout(limit, receiver.wait_for(|ready| *ready)).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!(
                    timeout_ms = limit.as_millis() as u64,
                    "readiness signal did not arrive in time; proceeding"
                );
            }
        };
    }
}

impl fmt::Debug for ReadyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyGate")
            .field("ready", &self.is_ready())
            .finish()
    }
}

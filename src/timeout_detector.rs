//! Scoped deadline guard (spec §4.6): a RAII wrapper around
//! `ping`/`close_timeout` so a task doesn't have to remember to clean up
//! after itself on every exit path, including panics.

use crate::client::WatchdogClient;

/// Registers `name` (optionally uniqued) against `client` on construction
/// and calls `close_timeout` on drop. Re-pinging while the guard is alive
/// is the caller's job: this type only owns the registration's
/// lifetime, not periodic refresh.
pub struct TimeoutDetector {
    client: WatchdogClient,
    name: String,
    closed: bool,
}

impl TimeoutDetector {
    pub(crate) fn new(
        client: WatchdogClient,
        name: String,
        timeout_seconds: u64,
        unique_suffix: bool,
    ) -> Self {
        let name = if unique_suffix {
            format!("{name}.{}", uuid::Uuid::new_v4())
        } else {
            name
        };

        client.ping(&name, timeout_seconds);
        Self {
            client,
            name,
            closed: false,
        }
    }

    /// The (possibly uniqued) task name this guard registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refreshes the deadline without waiting for drop.
    pub fn ping(&self, timeout_seconds: u64) {
        if !self.closed {
            self.client.ping(&self.name, timeout_seconds);
        }
    }

    /// Removes the task early; `Drop` becomes a no-op afterward.
    pub fn close(&mut self) {
        if !self.closed {
            self.client.close_timeout(&self.name);
            self.closed = true;
        }
    }
}

impl Drop for TimeoutDetector {
    fn drop(&mut self) {
        self.close();
    }
}

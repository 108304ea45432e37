//! The concurrent task→deadline map plus the one-way timed-out latch.
//!
//! All mutation happens under a single `Mutex` (spec §5), not a reentrant
//! lock. The one documented Python re-entry (the scheduler's assertion
//! helper logging while holding the registry lock) is resolved here by
//! having `assert_log` only ever call into `log`, which this crate never
//! wires back into the registry (see DESIGN.md, "Reentrant lock
//! requirement").

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Sentinel "no task pending" value for `next_check`.
pub(crate) const FAR_FUTURE: i64 = 0x7fff_ffff;

/// Everything the scheduler loop reads and mutates in one critical
/// section per iteration.
#[derive(Debug, Default)]
pub(crate) struct SchedulerState {
    pub tasks: HashMap<String, i64>,
    pub timed_out: HashSet<String>,
    pub next_check: i64,
}

impl SchedulerState {
    fn fresh() -> Self {
        Self {
            tasks: HashMap::new(),
            timed_out: HashSet::new(),
            next_check: FAR_FUTURE,
        }
    }
}

/// The task registry: name → absolute deadline (ms), plus the timed-out
/// set and the next-check cache, all guarded together.
#[derive(Debug)]
pub(crate) struct Registry {
    state: Mutex<SchedulerState>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState::fresh()),
        }
    }

    /// Wipes all runtime state back to a fresh lifecycle (spec §3,
    /// Lifecycle: `initialize` after `stop`).
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        *state = SchedulerState::fresh();
    }

    /// `tasks[name] = deadline_ms`, unconditionally, including for names
    /// already present in `timed_out` (spec §9, Ambiguity, ping of a
    /// timed-out task: the write still happens, the latch never clears).
    /// Returns whether the new deadline preempts the cached next check,
    /// i.e. whether the scheduler must be woken early.
    pub fn register_or_refresh(&self, name: &str, deadline_ms: i64) -> bool {
        let mut state = self.state.lock().unwrap();
        state.tasks.insert(name.to_string(), deadline_ms);
        deadline_ms < state.next_check
    }

    /// Removes `name` if present; a no-op otherwise. Never touches
    /// `timed_out`.
    pub fn close(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.tasks.remove(name);
    }

    /// Snapshot of the current task names, independent of later mutation.
    pub fn task_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.tasks.keys().cloned().collect()
    }

    pub fn is_timed_out(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.timed_out.is_empty()
    }

    pub fn contains_task(&self, name: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.tasks.contains_key(name)
    }

    /// Grants the scheduler loop exclusive access to the whole state for
    /// one iteration: the only caller allowed to touch `timed_out`.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SchedulerState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

//! The scheduler loop: the sole writer of the timed-out set, the sole
//! sender of heartbeats (spec §4.2).
//!
//! `run_iteration` is a free function, deliberately decoupled from
//! `tokio`, so the earliest-deadline bookkeeping can be unit tested
//! without spinning up a runtime or sleeping real time. [`run_forever`]
//! wires it into the actual tokio task spawned by `WatchdogClient::start`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::assert_log::assert_log;
use crate::clock::MonotonicClock;
use crate::registry::{Registry, FAR_FUTURE};
use crate::transport::HeartbeatTransport;

/// 50ms slack so the loop doesn't wake a hair before a deadline and
/// re-sleep; 100ms floor caps wake-rate; 60s ceiling bounds clock-drift
/// blind time and guarantees liveness if the trigger is ever lost.
const WAIT_SLACK_MS: i64 = 50;
const WAIT_FLOOR_MS: i64 = 100;
const WAIT_CEILING_MS: i64 = 60_000;

/// Outcome of a single scheduler tick, used both to drive the UDP send /
/// error log outside the registry lock and for unit testing the
/// bookkeeping in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IterationOutcome {
    pub timeout_detected: bool,
    pub heartbeat_due: bool,
    pub wait_ms: u64,
}

/// One tick of the algorithm in spec §4.2. Takes and releases the
/// registry lock exactly once.
pub(crate) fn run_iteration(
    registry: &Registry,
    clock: &dyn MonotonicClock,
    heartbeat_task_name: &str,
    udp_ping_interval_ms: i64,
) -> IterationOutcome {
    let now = clock.now_ms();
    let mut timeout_detected = false;
    let mut heartbeat_due = false;

    let next_check = registry.with_state(|state| {
        state.next_check = FAR_FUTURE;

        let names: Vec<String> = state.tasks.keys().cloned().collect();
        for name in names {
            if timeout_detected && name == heartbeat_task_name {
                assert_log(
                    !state.tasks.contains_key(heartbeat_task_name),
                    "heartbeat task should already be gone once a timeout is detected",
                );
                continue;
            }

            // May already be gone if an earlier name in this same pass
            // timed out and removed the heartbeat task.
            let mut deadline = match state.tasks.get(&name) {
                Some(d) => *d,
                None => continue,
            };

            if deadline <= now {
                if name == heartbeat_task_name {
                    if !timeout_detected {
                        deadline = now + udp_ping_interval_ms;
                        state.tasks.insert(heartbeat_task_name.to_string(), deadline);
                        heartbeat_due = true;
                    }
                } else if !state.timed_out.contains(&name) {
                    state.timed_out.insert(name.clone());
                    timeout_detected = true;
                    state.tasks.remove(&name);
                    state.tasks.remove(heartbeat_task_name);
                }
            }

            if deadline > now && deadline < state.next_check {
                state.next_check = deadline;
            }
        }

        state.next_check
    });

    let wait_ms = (next_check - now + WAIT_SLACK_MS)
        .clamp(WAIT_FLOOR_MS, WAIT_CEILING_MS)
        .max(0) as u64;

    IterationOutcome {
        timeout_detected,
        heartbeat_due,
        wait_ms,
    }
}

/// Resources the scheduler needs to run unattended once spawned.
pub(crate) struct SchedulerHandles {
    pub registry: Arc<Registry>,
    pub clock: Arc<dyn MonotonicClock>,
    pub transport: Arc<dyn HeartbeatTransport>,
    pub trigger: Arc<Notify>,
    pub stop: Arc<std::sync::atomic::AtomicBool>,
    pub heartbeat_task_name: String,
    pub udp_ping_interval_ms: i64,
    pub udp_port: Option<u16>,
    pub watchdog_secret: Vec<u8>,
}

/// The loop body spawned as a tokio task by `start()`. Any panic escaping
/// an iteration is caught, logged at error severity, and the loop exits:
/// a bug signal, not a recovery path (spec §4.2, §7).
pub(crate) async fn run_forever(handles: SchedulerHandles) {
    use std::sync::atomic::Ordering;

    loop {
        if handles.stop.load(Ordering::SeqCst) {
            break;
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_iteration(
                &handles.registry,
                handles.clock.as_ref(),
                &handles.heartbeat_task_name,
                handles.udp_ping_interval_ms,
            )
        }));

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(_) => {
                log::error!("exception/bug in background loop, please check and fix");
                break;
            }
        };

        if outcome.timeout_detected {
            let timed_out = handles.registry.with_state(|s| {
                let mut names: Vec<String> = s.timed_out.iter().cloned().collect();
                names.sort();
                names
            });
            log::error!("timed out tasks: {}", timed_out.join(","));
        } else if outcome.heartbeat_due {
            assert_log(
                handles.registry.contains_task(&handles.heartbeat_task_name),
                "heartbeat task should still be registered before sending a ping",
            );
            if let Some(port) = handles.udp_port {
                log::debug!("sending UDP ping");
                if let Err(e) = handles.transport.send(port, &handles.watchdog_secret) {
                    log::debug!("UDP heartbeat send failed (fire-and-forget): {e}");
                }
            }
        }

        if handles.stop.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            _ = handles.trigger.notified() => {}
            _ = tokio::time::sleep(Duration::from_millis(outcome.wait_ms)) => {}
        }
    }

    log::debug!("background loop done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FakeClock {
        now: AtomicI64,
    }

    impl FakeClock {
        fn new(start: i64) -> Self {
            Self {
                now: AtomicI64::new(start),
            }
        }

        fn set(&self, value: i64) {
            self.now.store(value, Ordering::SeqCst);
        }
    }

    impl MonotonicClock for FakeClock {
        fn now_ms(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    const HEARTBEAT: &str = "_udpPing.test-fixture";

    #[test]
    fn idle_registry_yields_ceiling_wait() {
        let registry = Registry::new();
        let clock = FakeClock::new(0);
        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);
        assert!(!outcome.timeout_detected);
        assert!(!outcome.heartbeat_due);
        assert_eq!(outcome.wait_ms, 60_000);
    }

    #[test]
    fn heartbeat_fires_and_reschedules_when_due() {
        let registry = Registry::new();
        registry.register_or_refresh(HEARTBEAT, 0);
        let clock = FakeClock::new(0);

        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);

        assert!(outcome.heartbeat_due);
        assert!(!outcome.timeout_detected);
        assert!(registry.contains_task(HEARTBEAT));
        registry.with_state(|s| assert_eq!(s.tasks[HEARTBEAT], 10_000));
    }

    #[test]
    fn user_task_latches_and_removes_heartbeat() {
        let registry = Registry::new();
        registry.register_or_refresh(HEARTBEAT, 5_000);
        registry.register_or_refresh("task1", 0);
        let clock = FakeClock::new(0);

        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);

        assert!(outcome.timeout_detected);
        assert!(!outcome.heartbeat_due);
        assert!(!registry.contains_task("task1"));
        assert!(!registry.contains_task(HEARTBEAT));
        assert!(registry.is_timed_out());
    }

    #[test]
    fn already_timed_out_task_never_relatches() {
        let registry = Registry::new();
        registry.with_state(|s| {
            s.timed_out.insert("task1".to_string());
        });
        registry.register_or_refresh("task1", 0);
        let clock = FakeClock::new(0);

        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);

        // Re-appearing in `tasks` with an expired deadline does not
        // produce a second latch event.
        assert!(!outcome.timeout_detected);
        registry.with_state(|s| assert_eq!(s.timed_out.len(), 1));
    }

    #[test]
    fn wait_ms_is_clamped_to_the_floor_for_an_imminent_deadline() {
        let registry = Registry::new();
        registry.register_or_refresh("task1", 1_000);
        let clock = FakeClock::new(980);

        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);

        assert_eq!(outcome.wait_ms, 100);
    }

    #[test]
    fn wait_ms_follows_next_check_plus_slack_within_bounds() {
        let registry = Registry::new();
        registry.register_or_refresh("task1", 5_000);
        let clock = FakeClock::new(0);

        let outcome = run_iteration(&registry, &clock, HEARTBEAT, 10_000);

        assert_eq!(outcome.wait_ms, 5_050);
    }

    #[test]
    fn fake_clock_allows_deterministic_advance() {
        let clock = FakeClock::new(0);
        clock.set(1_234);
        assert_eq!(clock.now_ms(), 1_234);
    }
}

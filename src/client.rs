//! The public watchdog client surface (spec §4.5, §6).
//!
//! `WatchdogClient` is a cheaply-cloned handle (an `Arc` inside), not a
//! static class: multiple independent instances are fully supported, and
//! [`default_client`] exists only for call sites that want one shared
//! process-wide instance (spec §9, Process-wide singleton note).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::clock::{MonotonicClock, SystemClock};
use crate::config::{ConfigSource, EnvOverrides, WatchdogConfig};
use crate::error::WatchdogError;
use crate::registry::Registry;
use crate::scheduler::{run_forever, SchedulerHandles};
use crate::shutdown::{platform_waiter, ShutdownWaiter};
use crate::timeout_detector::TimeoutDetector;
use crate::transport::{HeartbeatTransport, UdpHeartbeatTransport};

struct Inner {
    registry: Arc<Registry>,
    clock: Arc<dyn MonotonicClock>,
    transport: Arc<dyn HeartbeatTransport>,
    shutdown_waiter: Arc<dyn ShutdownWaiter>,
    trigger: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
    heartbeat_task_name: String,
    config: Mutex<WatchdogConfig>,
    env: Mutex<EnvOverrides>,
}

/// Handle to one watchdog client instance. Clone is a cheap `Arc` bump;
/// every clone observes the same registry, scheduler, and lifecycle
/// state.
#[derive(Clone)]
pub struct WatchdogClient(Arc<Inner>);

impl WatchdogClient {
    /// Builds a client backed by the real clock, a real UDP transport,
    /// and the platform-appropriate shutdown waiter.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(SystemClock::new()),
            Arc::new(UdpHeartbeatTransport),
            platform_waiter().into(),
        )
    }

    /// Builds a client from injected parts (the seam tests use to
    /// substitute a fake clock or a recording transport).
    pub fn with_parts(
        clock: Arc<dyn MonotonicClock>,
        transport: Arc<dyn HeartbeatTransport>,
        shutdown_waiter: Arc<dyn ShutdownWaiter>,
    ) -> Self {
        let heartbeat_task_name = format!("_udpPing.{}", uuid::Uuid::new_v4());
        Self(Arc::new(Inner {
            registry: Arc::new(Registry::new()),
            clock,
            transport,
            shutdown_waiter,
            trigger: Arc::new(Notify::new()),
            stopped: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            heartbeat_task_name,
            config: Mutex::new(WatchdogConfig::default()),
            env: Mutex::new(EnvOverrides::default()),
        }))
    }

    /// Reads `Enabled` / `UdpPingInterval` from `cfg`. If the client was
    /// previously `stop()`-ed, this also clears the terminal flag and all
    /// runtime state so a fresh `start()` is permitted (spec §3,
    /// Lifecycle).
    pub fn initialize(&self, cfg: &dyn ConfigSource) {
        let resolved = WatchdogConfig::from_source(cfg);
        *self.0.config.lock().unwrap() = resolved;

        let was_stopped = self.0.stopped.swap(false, Ordering::SeqCst);
        if was_stopped {
            self.0.registry.reset();
        }
    }

    /// Launches the scheduler loop. Reads `SHUTDOWN_EVENT`,
    /// `WATCHDOG_SECRET`, `WATCHDOG_PORT` from the environment. Fails if
    /// called after `stop()` without an intervening `initialize()` (spec
    /// §4.5).
    pub async fn start(&self) -> Result<(), WatchdogError> {
        if self.0.stopped.load(Ordering::SeqCst) {
            return Err(WatchdogError::AlreadyStopped);
        }

        let env = EnvOverrides::read_from_env();
        *self.0.env.lock().unwrap() = env.clone();

        let (enabled, udp_ping_interval_ms) = {
            let cfg = self.0.config.lock().unwrap();
            (cfg.enabled, cfg.udp_ping_interval_ms)
        };

        if !enabled {
            log::info!("watchdog client not enabled");
            return Ok(());
        }

        log::info!("starting watchdog client");

        if let Some(port) = env.watchdog_port {
            let now = self.0.clock.now_ms();
            self.0
                .registry
                .register_or_refresh(&self.0.heartbeat_task_name, now + 1);
            log::debug!("UDP pinging configured on port {port}");
        }

        let handles = SchedulerHandles {
            registry: Arc::clone(&self.0.registry),
            clock: Arc::clone(&self.0.clock),
            transport: Arc::clone(&self.0.transport),
            trigger: Arc::clone(&self.0.trigger),
            stop: Arc::clone(&self.0.stopped),
            heartbeat_task_name: self.0.heartbeat_task_name.clone(),
            udp_ping_interval_ms,
            udp_port: env.watchdog_port,
            watchdog_secret: env.watchdog_secret,
        };

        let join = tokio::spawn(run_forever(handles));
        *self.0.task.lock().unwrap() = Some(join);

        log::info!("watchdog client started");
        Ok(())
    }

    /// Sets the terminal stop flag and joins the scheduler, re-firing the
    /// trigger every second until it exits (spec §4.5). Idempotent in
    /// effect: calling `stop()` with no scheduler running just sets the
    /// flag.
    pub async fn stop(&self) {
        log::info!("stopping watchdog client");
        self.0.stopped.store(true, Ordering::SeqCst);

        let handle = self.0.task.lock().unwrap().take();
        if let Some(mut handle) = handle {
            loop {
                self.0.trigger.notify_one();
                tokio::select! {
                    result = &mut handle => {
                        if let Err(e) = result {
                            log::error!("background loop task panicked: {e}");
                        }
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        continue;
                    }
                }
            }
        }

        log::info!("watchdog client stopped");
    }

    /// Refreshes `name`'s deadline to `now + timeout_seconds`. A no-op
    /// while disabled. Does not resurrect an already-timed-out name (spec
    /// §9, Ambiguity note): the write still happens, the latch stays.
    pub fn ping(&self, name: &str, timeout_seconds: u64) {
        log::debug!("task_name={name}, timeout_seconds={timeout_seconds}");

        if !self.0.config.lock().unwrap().enabled {
            return;
        }

        let now = self.0.clock.now_ms();
        let deadline = now + (timeout_seconds as i64) * 1000;
        let do_trigger = self.0.registry.register_or_refresh(name, deadline);
        if do_trigger {
            self.0.trigger.notify_one();
        }
    }

    /// Removes `name` from monitoring if present; otherwise a no-op.
    pub fn close_timeout(&self, name: &str) {
        log::debug!("task_name={name}");
        self.0.registry.close(name);
    }

    /// True iff the client is enabled and at least one task has ever
    /// timed out this lifecycle. Monotonic: never flips back to `false`
    /// short of a full `stop()` + `initialize()`.
    pub fn is_timed_out(&self) -> bool {
        self.0.config.lock().unwrap().enabled && self.0.registry.is_timed_out()
    }

    /// True iff the reserved heartbeat task is currently registered.
    pub fn is_udp_pinging_active(&self) -> bool {
        self.0.registry.contains_task(&self.0.heartbeat_task_name)
    }

    /// Snapshot of currently monitored task names (includes the heartbeat
    /// task, if active).
    pub fn task_list(&self) -> Vec<String> {
        self.0.registry.task_names()
    }

    /// Waits up to `timeout` for the supervisor's shutdown event. Sleeps
    /// and returns `false` if no `SHUTDOWN_EVENT` name was configured at
    /// `start()` (spec §4.4).
    pub async fn wait_for_shutdown_event(&self, timeout: Duration) -> bool {
        let event_name = self.0.env.lock().unwrap().shutdown_event.clone();
        if event_name.is_empty() {
            tokio::time::sleep(timeout).await;
            return false;
        }

        let waiter = Arc::clone(&self.0.shutdown_waiter);
        tokio::task::spawn_blocking(move || waiter.wait(&event_name, timeout))
            .await
            .unwrap_or(false)
    }

    /// Registers a scoped deadline for the returned guard's lifetime. See
    /// [`TimeoutDetector`].
    pub fn timeout_detector(
        &self,
        name: impl Into<String>,
        timeout_seconds: u64,
        unique_suffix: bool,
    ) -> TimeoutDetector {
        TimeoutDetector::new(self.clone(), name.into(), timeout_seconds, unique_suffix)
    }
}

impl Default for WatchdogClient {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_CLIENT: OnceLock<WatchdogClient> = OnceLock::new();

/// A lazily-initialized, process-wide default instance, for call sites
/// that want Python-static-class ergonomics. Using it is optional: every
/// operation here is equally available on any `WatchdogClient::new()`.
pub fn default_client() -> &'static WatchdogClient {
    DEFAULT_CLIENT.get_or_init(WatchdogClient::new)
}

//! A UDP-heartbeat watchdog client: a background scheduler that tracks
//! per-task deadlines, detects the first one to lapse, and optionally
//! pings a supervising process over UDP for as long as nothing else has.
//!
//! # Module organization
//!
//! - **client**: the public [`WatchdogClient`] handle (`initialize`,
//!   `start`, `stop`, `ping`, `close_timeout`, and the status queries).
//! - **timeout_detector**: [`TimeoutDetector`], a scoped RAII guard over
//!   `ping`/`close_timeout`.
//! - **scheduler**: the background loop's per-tick bookkeeping.
//! - **registry**: the task→deadline map and the one-way timed-out latch.
//! - **config**: the [`ConfigSource`] trait and the resolved
//!   [`WatchdogConfig`].
//! - **clock** / **transport** / **shutdown**: the external-collaborator
//!   seams (monotonic time, UDP delivery, the supervisor's shutdown
//!   event) kept as traits so the scheduler is unit-testable without a
//!   real clock, socket, or OS event.
//! - **error**: [`WatchdogError`], the crate's one fallible outcome.
//!
//! # Example
//!
//! ```no_run
//! use svc_watchdog_client::{WatchdogClient, MapConfigSource};
//!
//! # async fn run() -> Result<(), svc_watchdog_client::WatchdogError> {
//! let client = WatchdogClient::new();
//! client.initialize(&MapConfigSource::new());
//! client.start().await?;
//!
//! client.ping("main_loop", 30);
//! // ... do work, re-ping "main_loop" periodically ...
//!
//! client.close_timeout("main_loop");
//! client.stop().await;
//! # Ok(())
//! # }
//! ```

mod assert_log;
mod client;
mod clock;
mod config;
mod error;
mod registry;
mod scheduler;
mod shutdown;
mod timeout_detector;
mod transport;

pub use client::{default_client, WatchdogClient};
pub use clock::{MonotonicClock, SystemClock};
pub use config::{ConfigSource, MapConfigSource, WatchdogConfig, SECTION};
pub use error::WatchdogError;
pub use shutdown::{platform_waiter, ShutdownWaiter, SleepWaiter};
pub use timeout_detector::TimeoutDetector;
pub use transport::{HeartbeatTransport, UdpHeartbeatTransport};

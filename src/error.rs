//! Error types for the two fallible seams of the watchdog client.
//!
//! Everything else in the public surface is infallible by design (spec
//! §7): `ping`/`close_timeout` never fail visibly, invalid `WATCHDOG_PORT`
//! just disables UDP pinging, and an unopenable shutdown event just falls
//! back to a sleep. Only lifecycle misuse is raised to the caller.

use thiserror::Error;

/// Lifecycle misuse: the one error the public surface actually returns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchdogError {
    /// `start()` was called after `stop()` without an intervening
    /// `initialize()`.
    #[error("watchdog client already stopped, not allowed to start it again")]
    AlreadyStopped,
}

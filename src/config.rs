//! Typed configuration surface.
//!
//! INI parsing itself is an external collaborator (see Non-goals). This
//! module only defines what the core needs from a configuration source:
//! case-insensitive, section-scoped, typed getters with defaults. Host
//! services plug in their own `ConfigSource`; [`MapConfigSource`] below is
//! a minimal in-memory stand-in for tests and the demo binary, not a
//! general-purpose config format.

use std::collections::HashMap;

/// Section name under which the watchdog client's settings live, kept
/// verbatim as the wire-level contract with whatever `ConfigSource` a
/// host service supplies.
pub const SECTION: &str = "SvcWatchDogClient";

/// A read-only, typed, keyed configuration source.
///
/// Getters return `default` when the key is absent, matching the
/// conventional INI-getter contract this crate consumes but does not
/// implement.
pub trait ConfigSource {
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
}

/// Resolved, typed configuration for the watchdog client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub enabled: bool,
    pub udp_ping_interval_ms: i64,
}

impl WatchdogConfig {
    pub fn from_source(cfg: &dyn ConfigSource) -> Self {
        let enabled = cfg.get_bool(SECTION, "Enabled", true);
        let interval_seconds = cfg.get_int(SECTION, "UdpPingInterval", 10);
        Self {
            enabled,
            udp_ping_interval_ms: interval_seconds * 1000,
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            udp_ping_interval_ms: 10_000,
        }
    }
}

/// Minimal in-memory `ConfigSource`, case-insensitive on section and key.
/// Intended for tests and the demo binary: real deployments supply their
/// own INI- or TOML-backed source.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: HashMap<(String, String), String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, section: &str, key: &str, value: impl Into<String>) -> Self {
        self.values
            .insert((section.to_lowercase(), key.to_lowercase()), value.into());
        self
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&str> {
        self.values
            .get(&(section.to_lowercase(), key.to_lowercase()))
            .map(String::as_str)
    }
}

impl ConfigSource for MapConfigSource {
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.lookup(section, key) {
            Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
            None => default,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.lookup(section, key) {
            Some(v) => v.parse().unwrap_or(default),
            None => default,
        }
    }
}

/// Environment variables read once at `start()`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvOverrides {
    pub shutdown_event: String,
    pub watchdog_secret: Vec<u8>,
    pub watchdog_port: Option<u16>,
}

impl EnvOverrides {
    pub fn read_from_env() -> Self {
        let shutdown_event = std::env::var("SHUTDOWN_EVENT").unwrap_or_default();
        let watchdog_secret = std::env::var("WATCHDOG_SECRET")
            .unwrap_or_default()
            .into_bytes();

        let watchdog_port = match std::env::var("WATCHDOG_PORT") {
            Ok(raw) => match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    log::error!("invalid WATCHDOG_PORT value: {raw}");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            shutdown_event,
            watchdog_secret,
            watchdog_port,
        }
    }
}

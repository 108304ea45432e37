//! Waiting on the supervisor's shutdown signal.
//!
//! The supervisor signals an OS-level manual-reset event; once signaled it
//! stays signaled, so every caller that waits afterward observes `true`
//! (spec §4.4). Platforms without a native named-event primitive fall back
//! to a plain sleep. The watchdog scheduler keeps running either way, only
//! orderly external shutdown becomes unavailable (spec §9, Platform gate).

use std::time::Duration;

/// Abstraction over the OS-level named shutdown event.
///
/// `wait` blocks up to `timeout` and returns whether the event was
/// observed signaled (as opposed to the wait timing out).
pub trait ShutdownWaiter: Send + Sync {
    fn wait(&self, name: &str, timeout: Duration) -> bool;
}

/// Degrades to a sleep: used whenever no `SHUTDOWN_EVENT` name is
/// configured, and as the fallback on platforms without a native event.
#[derive(Debug, Default)]
pub struct SleepWaiter;

impl ShutdownWaiter for SleepWaiter {
    fn wait(&self, _name: &str, timeout: Duration) -> bool {
        std::thread::sleep(timeout);
        false
    }
}

/// Picks the platform-appropriate waiter: a real named event on Windows,
/// a sleep everywhere else.
pub fn platform_waiter() -> Box<dyn ShutdownWaiter> {
    #[cfg(windows)]
    {
        Box::new(windows_impl::NamedEventWaiter)
    }
    #[cfg(not(windows))]
    {
        Box::new(SleepWaiter)
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::ShutdownWaiter;
    use std::time::Duration;
    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
    use windows_sys::Win32::System::Threading::{
        OpenEventW, WaitForSingleObject, EVENT_ALL_ACCESS,
    };

    /// Opens (but never creates) the supervisor's manual-reset event by
    /// name for each wait call, mirroring the original's
    /// `win32event.OpenEvent` / `WaitForSingleObject` / `CloseHandle`
    /// sequence: no handle is held across calls (spec §5, Resource
    /// discipline).
    pub struct NamedEventWaiter;

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    impl ShutdownWaiter for NamedEventWaiter {
        fn wait(&self, name: &str, timeout: Duration) -> bool {
            let wide_name = to_wide(name);
            let handle: HANDLE = unsafe { OpenEventW(EVENT_ALL_ACCESS, 0, wide_name.as_ptr()) };

            if handle.is_null() {
                log::error!("shutdown event {name} not available");
                std::thread::sleep(timeout);
                return false;
            }

            let millis = timeout.as_millis().min(u32::MAX as u128) as u32;
            let result = unsafe { WaitForSingleObject(handle, millis) };
            unsafe { CloseHandle(handle) };

            let signaled = result == WAIT_OBJECT_0;
            if signaled {
                log::info!("shutdown requested");
            }
            signaled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn sleep_waiter_sleeps_for_timeout_and_returns_false() {
        let waiter = SleepWaiter;
        let start = Instant::now();
        let signaled = waiter.wait("anything", Duration::from_millis(30));
        assert!(!signaled);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn platform_waiter_is_constructible() {
        let _waiter = platform_waiter();
    }
}

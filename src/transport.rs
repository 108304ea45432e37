//! UDP heartbeat transport.
//!
//! Fire-and-forget by design (spec Non-goals): a dropped datagram is
//! indistinguishable from a slow supervisor, and that's fine. The
//! supervisor is the one watching for silence.

use std::net::UdpSocket;

/// Sends one heartbeat datagram per call. Implementations must not block
/// meaningfully; loopback UDP sends are non-blocking in practice.
pub trait HeartbeatTransport: Send + Sync {
    /// Send `payload` to `127.0.0.1:port`. Errors are logged by the caller,
    /// never propagated: heartbeats are fire-and-forget.
    fn send(&self, port: u16, payload: &[u8]) -> std::io::Result<()>;
}

/// The real transport: opens a socket per send and lets it drop.
///
/// Matches the original implementation's `with socket.socket(...) as sock`
/// pattern: no long-held OS resources (spec §5, Resource discipline).
#[derive(Debug, Default)]
pub struct UdpHeartbeatTransport;

impl HeartbeatTransport for UdpHeartbeatTransport {
    fn send(&self, port: u16, payload: &[u8]) -> std::io::Result<()> {
        let socket = UdpSocket::bind("127.0.0.1:0")?;
        socket.send_to(payload, ("127.0.0.1", port))?;
        Ok(())
    }
}

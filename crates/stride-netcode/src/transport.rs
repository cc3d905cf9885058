//! Transport trait for moving encoded packets between nodes
//!
//! Implement this for the network stack in use (UDP socket, WebSocket, an
//! in-memory link for tests). Delivery may be unreliable: packets can be
//! lost, duplicated or reordered, and the protocol copes with all three.

use crate::error::{Error, Result};
use crate::wire::Packet;

/// Point-to-point datagram transport
pub trait Transport: Send + Sync {
    /// Error type for this transport
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one datagram (best effort)
    fn send(&self, data: &[u8]) -> std::result::Result<(), Self::Error>;

    /// Receive one datagram (non-blocking)
    ///
    /// Returns `Ok(None)` if no data is available.
    fn recv(&self) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Encode and send a packet
    fn send_packet(&self, packet: &Packet) -> Result<()> {
        let bytes = packet.encode()?;
        self.send(&bytes).map_err(|e| Error::Transport(e.to_string()))
    }

    /// Drain every datagram currently available
    fn drain(&self) -> Result<Vec<Vec<u8>>> {
        let mut received = Vec::new();
        while let Some(bytes) = self.recv().map_err(|e| Error::Transport(e.to_string()))? {
            received.push(bytes);
        }
        Ok(received)
    }
}

//! In-memory datagram transport
//!
//! Moves datagrams over Tokio channels instead of a socket. Used by the test
//! suites to script a server in-process, and usable for single-player
//! sessions where client and server share a process. Unlike UDP it neither
//! loses nor reorders anything; tests that want loss just drop datagrams on
//! the scripted side.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use veles_protocol::Transport;

/// Channel-backed datagram transport
pub struct MemoryTransport {
    to_peer: mpsc::Sender<Bytes>,
    from_peer: mpsc::Receiver<Bytes>,
}

impl MemoryTransport {
    pub fn new(to_peer: mpsc::Sender<Bytes>, from_peer: mpsc::Receiver<Bytes>) -> Self {
        Self { to_peer, from_peer }
    }

    /// Creates two connected transports, one per side of the link
    ///
    /// # Example
    ///
    /// ```
    /// use veles_client::transport::MemoryTransport;
    ///
    /// let (client_side, server_side) = MemoryTransport::pair(64);
    /// ```
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(buffer);
        let (b_tx, b_rx) = mpsc::channel(buffer);
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    type Error = MemoryTransportError;

    async fn run(
        mut self,
        incoming_tx: mpsc::Sender<Bytes>,
        mut outgoing_rx: mpsc::Receiver<Bytes>,
    ) -> Result<(), Self::Error> {
        loop {
            tokio::select! {
                datagram = self.from_peer.recv() => {
                    match datagram {
                        Some(datagram) => {
                            if incoming_tx.send(datagram).await.is_err() {
                                // Engine gone; nothing left to deliver to.
                                return Ok(());
                            }
                        }
                        None => return Ok(()),
                    }
                }

                datagram = outgoing_rx.recv() => {
                    match datagram {
                        Some(datagram) => {
                            // Full or closed peer channel is packet loss.
                            let _ = self.to_peer.try_send(datagram);
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryTransportError {
    #[error("transport channel closed")]
    ChannelClosed,
}

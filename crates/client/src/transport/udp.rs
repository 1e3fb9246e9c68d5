//! UDP datagram transport
//!
//! The canonical transport for real sessions: one connected UDP socket to
//! the server, one datagram per protocol message. Loss, duplication and
//! reordering are handled above this layer; send failures are swallowed as
//! loss.

use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use veles_protocol::Transport;

/// Largest datagram this transport will send or accept
///
/// Protocol messages are far smaller in practice; anything bigger than this
/// is not ours.
const MAX_DATAGRAM_SIZE: usize = 16 * 1024;

/// UDP client transport connected to a single server address
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    type Error = UdpTransportError;

    async fn run(
        self,
        incoming_tx: mpsc::Sender<Bytes>,
        mut outgoing_rx: mpsc::Receiver<Bytes>,
    ) -> Result<(), Self::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(UdpTransportError::Bind)?;
        socket
            .connect(self.server_addr)
            .await
            .map_err(UdpTransportError::Connect)?;

        tracing::info!(server = %self.server_addr, "UDP transport running");

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            tokio::select! {
                received = socket.recv(&mut buf) => {
                    match received {
                        Ok(len) => {
                            let datagram = Bytes::copy_from_slice(&buf[..len]);
                            if incoming_tx.send(datagram).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            // Transient ICMP-style errors show up here; treat
                            // them as loss and keep listening.
                            tracing::debug!(error = %e, "UDP receive error");
                        }
                    }
                }

                datagram = outgoing_rx.recv() => {
                    match datagram {
                        Some(datagram) => {
                            if datagram.len() > MAX_DATAGRAM_SIZE {
                                tracing::warn!(len = datagram.len(), "dropping oversized outbound datagram");
                                continue;
                            }
                            if let Err(e) = socket.send(&datagram).await {
                                tracing::debug!(error = %e, "UDP send failed, dropping datagram");
                            }
                        }
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

/// UDP transport errors
#[derive(Debug, thiserror::Error)]
pub enum UdpTransportError {
    #[error("failed to bind local socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to connect to server: {0}")]
    Connect(#[source] io::Error),
}

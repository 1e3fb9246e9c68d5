//! Transport layer abstraction
//!
//! The engine is transport-agnostic: it sends and receives opaque datagrams
//! through a pair of channels, and a `Transport` implementation bridges those
//! channels onto an actual network (UDP, in-memory channels for tests, or
//! anything else datagram-shaped). Loss, duplication and reordering are all
//! permitted; each datagram that does arrive must arrive intact.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Datagram transport abstraction
///
/// Implementations establish connectivity and then run a loop that moves
/// datagrams between the network and the engine's channels:
///
/// - network → `incoming_tx`: every received datagram, as-is
/// - `outgoing_rx` → network: every datagram the engine wants sent
///
/// Delivery is best-effort in both directions. A transport that cannot send
/// a datagram simply drops it; recovery is the protocol's job.
///
/// # Example: implementing a custom transport
///
/// ```no_run
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use tokio::sync::mpsc;
/// use veles_protocol::Transport;
///
/// struct NullTransport;
///
/// #[async_trait]
/// impl Transport for NullTransport {
///     type Error = std::io::Error;
///
///     async fn run(
///         self,
///         _incoming_tx: mpsc::Sender<Bytes>,
///         mut outgoing_rx: mpsc::Receiver<Bytes>,
///     ) -> Result<(), Self::Error> {
///         // Swallow everything: 100% packet loss.
///         while outgoing_rx.recv().await.is_some() {}
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + 'static {
    /// Error type for this transport
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the transport, bridging datagram channels until either side
    /// shuts down
    ///
    /// Returns `Ok(())` on graceful shutdown (engine channels closed), or an
    /// error if the underlying network failed in a way the transport cannot
    /// absorb as packet loss.
    async fn run(
        self,
        incoming_tx: mpsc::Sender<Bytes>,
        outgoing_rx: mpsc::Receiver<Bytes>,
    ) -> Result<(), Self::Error>;
}

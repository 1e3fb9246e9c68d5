//! Client-side transports
//!
//! Both bridge the engine's datagram channels onto something that actually
//! moves bytes: `UdpTransport` for real networks, `MemoryTransport` for
//! tests and same-process servers.

pub mod memory;
pub mod udp;

pub use memory::MemoryTransport;
pub use udp::UdpTransport;
pub use veles_protocol::Transport;

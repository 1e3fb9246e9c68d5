//! # Veles
//!
//! Client-side core of a rollback/replay lockstep networking engine for
//! real-time multiplayer simulations:
//! - Deterministic tick simulation seam, generic over world and input types
//! - Prediction from speculative "hint" inputs, with automatic rollback to
//!   authoritative state
//! - Clock synchronization against the server's tick timeline
//! - UDP-like datagram transports (lossy, reorderable)
//!
//! ## Components
//!
//! - `veles-protocol`: wire messages, codec and the transport seam
//! - `veles-simulation`: the deterministic `Simulation` trait games implement
//! - `veles-client`: the tick state machine and prediction/rollback engine

pub use veles_client as client;
pub use veles_protocol as protocol;
pub use veles_simulation as simulation;

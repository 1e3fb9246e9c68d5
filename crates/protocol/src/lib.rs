//! # Veles Protocol
//!
//! Wire-level definitions for the Veles lockstep engine.
//!
//! This crate provides:
//! - `Tick` and `PlayerId`: the simulation step and identity types every
//!   participant agrees on
//! - `Message<I>`: the closed set of protocol messages, generic over the
//!   application's input type
//! - `Codec`: pluggable payload serialization (postcard on the wire, JSON
//!   for debugging)
//! - `Transport`: the datagram transport seam (UDP-like: lossy, reorderable)
//!
//! ## Example
//!
//! ```
//! use veles_protocol::codec::{Codec, PostcardCodec};
//! use veles_protocol::{Message, PlayerId, Tick};
//!
//! // A hint from the server: player 2 will press "7" at tick 40.
//! let msg: Message<u8> = Message::HintInput {
//!     tick: Tick::new(40),
//!     player: PlayerId::new(2),
//!     input: 7,
//! };
//!
//! let bytes = PostcardCodec.encode(&msg).unwrap();
//! let decoded: Message<u8> = PostcardCodec.decode(&bytes).unwrap();
//! assert_eq!(msg, decoded);
//! ```

pub mod codec;
pub mod error;
pub mod messages;
pub mod tick;
pub mod transport;

pub use codec::{Codec, JsonCodec, PostcardCodec};
pub use error::{ProtocolError, Result};
pub use messages::{InputMap, Message, MessageKind};
pub use tick::{PlayerId, Tick};
pub use transport::Transport;

//! Codec abstraction for datagram serialization
//!
//! The wire format is the postcard encoding of `Message<I>`: compact,
//! schemaless and stable across platforms. The JSON codec produces the same
//! messages in human-readable form and exists for debugging and traffic
//! inspection only; it is never negotiated.
//!
//! # Usage
//!
//! ```
//! use veles_protocol::codec::{Codec, PostcardCodec};
//! use veles_protocol::{Message, Tick};
//!
//! let msg: Message<u8> = Message::Ack { tick: Tick::new(12) };
//! let bytes = PostcardCodec.encode(&msg).unwrap();
//! let decoded: Message<u8> = PostcardCodec.decode(&bytes).unwrap();
//! assert_eq!(msg, decoded);
//! ```

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ProtocolError, Result};

/// Codec trait for serializing and deserializing wire messages
///
/// Implementations must be thread-safe; the same codec value is shared by
/// every task that touches the wire.
pub trait Codec: Send + Sync {
    /// Returns a human-readable name for this codec
    fn name(&self) -> &'static str;

    /// Encodes a serializable value into a datagram payload
    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes>;

    /// Decodes a datagram payload
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// The wire codec: compact postcard encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardCodec;

impl Codec for PostcardCodec {
    fn name(&self) -> &'static str {
        "Postcard"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes> {
        let vec = postcard::to_allocvec(value)
            .map_err(|e| ProtocolError::Codec(format!("postcard encode failed: {}", e)))?;
        Ok(Bytes::from(vec))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        postcard::from_bytes(bytes)
            .map_err(|e| ProtocolError::Codec(format!("postcard decode failed: {}", e)))
    }
}

/// Debug codec: human-readable JSON
///
/// Handy for dumping captured traffic; not wire-compatible with the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Bytes> {
        let vec = serde_json::to_vec(value)
            .map_err(|e| ProtocolError::Codec(format!("JSON encode failed: {}", e)))?;
        Ok(Bytes::from(vec))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes)
            .map_err(|e| ProtocolError::Codec(format!("JSON decode failed: {}", e)))
    }
}

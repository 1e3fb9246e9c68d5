use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("datagram too large: {size} bytes (limit {limit})")]
    OversizedDatagram { size: usize, limit: usize },
}

/// Result type for protocol-level operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

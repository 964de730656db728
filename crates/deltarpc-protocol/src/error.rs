//! Error types for the protocol layer.
//!
//! Each crate in deltarpc defines its own error enum. A `ProtocolError`
//! always means the problem is in turning frames into bytes or bytes
//! into frames, never in networking or call bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a frame into text).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a frame).
    ///
    /// Common causes: invalid JSON, a response `id` that is not an
    /// integer, or a frame that is neither a response nor a notification.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

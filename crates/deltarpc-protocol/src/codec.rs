//! Codec trait and implementations for serializing/deserializing frames.
//!
//! A "codec" (coder/decoder) converts between Rust types and the text
//! that travels in one WebSocket message. The client doesn't care HOW
//! frames are serialized; it just needs something that implements the
//! [`Codec`] trait.
//!
//! The wire protocol is text-framed (one JSON document per frame), so
//! `encode` produces a `String` while `decode` accepts raw bytes, because
//! a transport may hand us either text or binary messages.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to frame text and decode bytes back.
///
/// `Send + Sync + 'static` lets the client keep one codec inside its
/// shared state and use it from the reader task and from callers alike.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into the text of one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes the bytes of one frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is what the backend speaks.
///
/// ## Example
///
/// ```rust
/// use deltarpc_protocol::{Codec, InboundFrame, JsonCodec, Request, RequestId};
///
/// let codec = JsonCodec;
///
/// let request = Request::new(RequestId(1), "add_account", vec![]);
/// let text = codec.encode(&request).unwrap();
/// assert_eq!(text, r#"{"jsonrpc":"2.0","method":"add_account","id":1,"params":[]}"#);
///
/// let frame: InboundFrame = codec.decode(br#"{"id":1,"result":7}"#).unwrap();
/// assert!(matches!(frame, InboundFrame::Response(r) if r.id == RequestId(1)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

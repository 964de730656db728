//! Unified error type for the deltarpc client.

use deltarpc_protocol::{
    ErrorKind, ErrorPayload, EventKind, ProtocolError, RequestId,
};
use deltarpc_transport::TransportError;
use serde_json::Value;

use crate::SubscriptionId;

/// A failure reported by the backend in a response's `error` object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({kind}, code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    /// Classification of `code`. Informational only.
    pub kind: ErrorKind,
    pub data: Option<Value>,
}

impl From<ErrorPayload> for RpcError {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            kind: payload.kind(),
            code: payload.code,
            message: payload.message,
            data: payload.data,
        }
    }
}

/// Top-level error that wraps everything a client operation can hit.
///
/// Sub-crate errors convert via `#[from]`, so `?` works across layers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The operation needs an open link and there is none.
    #[error("not connected to backend")]
    NotConnected,

    /// `connect()` was called while another connect is still dialing.
    #[error("a connect attempt is already in progress")]
    ConnectInProgress,

    /// The link dropped while this call was waiting for its response.
    #[error("connection lost before a response arrived")]
    ConnectionLost,

    /// A response arrived for an id with no pending call.
    #[error("response for unknown request {0}")]
    OrphanResponse(RequestId),

    /// An inbound frame could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The backend answered with an error object.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Opening the link failed.
    #[error("connect failed: {0}")]
    Connect(#[source] TransportError),

    /// A transport-level error on an open link.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding an outbound frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Converting typed params or results to/from JSON failed.
    #[error("typed conversion failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A one-shot event wait was dropped before any event matched
    /// (for example by `release_context`).
    #[error("subscription removed before an event arrived")]
    SubscriptionDropped,
}

impl ClientError {
    /// The JSON-RPC classification, if the backend reported this error.
    pub fn rpc_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Rpc(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// A protocol anomaly observed by the reader task.
///
/// None of these fail a call on their own; they are logged and broadcast
/// on [`Client::diagnostics`](crate::Client::diagnostics) so that
/// callers and tests can observe them.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A response with no matching pending call.
    OrphanResponse(RequestId),
    /// A frame that failed to decode; carries the decode error text.
    MalformedFrame(String),
    /// A listener panicked while handling an event.
    ListenerPanicked {
        subscription: SubscriptionId,
        event: EventKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_from_payload_classifies_code() {
        let err = RpcError::from(ErrorPayload {
            code: -32602,
            message: "bad params".into(),
            data: None,
        });

        assert_eq!(err.kind, ErrorKind::InvalidParams);
        assert_eq!(err.to_string(), "bad params (invalid params, code -32602)");
    }

    #[test]
    fn test_from_rpc_error() {
        let err: ClientError = RpcError::from(ErrorPayload {
            code: -32050,
            message: "busy".into(),
            data: Some(Value::from(3)),
        })
        .into();

        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(err.rpc_kind(), Some(ErrorKind::ServerError));
    }

    #[test]
    fn test_from_transport_error() {
        let err: ClientError =
            TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.rpc_kind(), None);
    }

    #[test]
    fn test_from_protocol_error() {
        let err: ClientError =
            ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn test_orphan_response_names_the_id() {
        let err = ClientError::OrphanResponse(RequestId(42));
        assert_eq!(err.to_string(), "response for unknown request #42");
    }
}

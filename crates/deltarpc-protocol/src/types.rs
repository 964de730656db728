//! Frame types for the JSON-RPC wire format.
//!
//! Every WebSocket message carries exactly one of these documents:
//!
//! ```text
//! client → server   {"jsonrpc":"2.0","method":"…","id":N,"params":[…]}
//! server → client   {"id":N,"result":…}              (response)
//!                   {"id":N,"error":{code,message}}  (error response)
//!                   {"method":"event","params":{id,contextId,field1,field2}}
//! ```
//!
//! Note the overload: the `id` inside an event's `params` is an event
//! *type* tag, while the top-level `id` of a response is a request
//! correlation id. The two never share a namespace, which is why they get
//! distinct Rust types ([`RequestId`] vs. the `i64` in [`EventPayload`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ErrorKind, ProtocolError};

/// The `jsonrpc` version string stamped on every outbound request.
pub const JSONRPC_VERSION: &str = "2.0";

/// The `method` name the server uses for notifications.
pub const EVENT_METHOD: &str = "event";

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// A client-assigned request correlation id.
///
/// Ids start at [`RequestId::FIRST`] and grow by one per call. They are
/// serialized as plain JSON integers (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The first id a fresh client hands out.
    pub const FIRST: RequestId = RequestId(1);

    /// Largest id that every peer can represent exactly.
    ///
    /// The backend's reference clients are JavaScript, where integers are
    /// exact only up to `2^53 - 1`. At one call per microsecond that is
    /// still ~285 years of uptime, so the counter never wraps in practice.
    pub const MAX_SAFE: u64 = (1 << 53) - 1;

    /// Returns the id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An outbound request frame.
///
/// Field order matters only for readability of logs; serde emits fields
/// in declaration order, matching the documented wire layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    /// Positional parameters. The client never inspects them.
    pub params: Vec<Value>,
}

impl Request {
    /// Builds a JSON-RPC 2.0 request with positional parameters.
    pub fn new(
        id: RequestId,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            id,
            params,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// The `error` object of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorPayload {
    /// Stands in for a missing or non-integer `code`. Classifies as
    /// [`ErrorKind::Custom`].
    pub const UNSPECIFIED_CODE: i64 = 0;

    /// Classifies [`code`](Self::code) into the JSON-RPC taxonomy.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::classify(self.code)
    }

    /// Builds a payload from whatever the peer put in `error`.
    ///
    /// Never fails, so a response with an id always settles its call:
    /// a missing or non-integer `code` becomes
    /// [`UNSPECIFIED_CODE`](Self::UNSPECIFIED_CODE), a missing `message`
    /// becomes empty, a bare string is taken as the message, and any
    /// other non-object value is kept as `data`.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                code: map
                    .get("code")
                    .and_then(Value::as_i64)
                    .unwrap_or(Self::UNSPECIFIED_CODE),
                message: match map.remove("message") {
                    Some(Value::String(message)) => message,
                    None | Some(Value::Null) => String::new(),
                    Some(other) => other.to_string(),
                },
                data: map.remove("data").filter(|data| !data.is_null()),
            },
            Value::String(message) => Self {
                code: Self::UNSPECIFIED_CODE,
                message,
                data: None,
            },
            other => Self {
                code: Self::UNSPECIFIED_CODE,
                message: String::new(),
                data: Some(other),
            },
        }
    }
}

/// A response to one of our requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    /// `Ok` carries `result`; an absent and a `null` result both
    /// become `Value::Null`.
    pub outcome: Result<Value, ErrorPayload>,
}

/// The `params` of an `"event"` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Numeric event-type tag (see [`EventKind`](crate::EventKind)).
    pub id: i64,
    /// The account the event belongs to.
    ///
    /// Account ids are non-negative, so an event whose `contextId` is
    /// missing, negative, or above `u32::MAX` does not decode and is
    /// dropped as a malformed frame.
    #[serde(rename = "contextId")]
    pub context_id: u32,
    #[serde(default)]
    pub field1: Value,
    #[serde(default)]
    pub field2: Value,
}

/// One decoded server-to-client frame.
///
/// Deserializing goes through a permissive intermediate shape and then
/// classifies it, so a frame that is valid JSON but fits none of the
/// variants fails with a descriptive decode error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFrame")]
pub enum InboundFrame {
    /// A response correlated by request id.
    Response(Response),
    /// An `"event"` notification.
    Notification(EventPayload),
    /// A server-initiated request for some other method. The client
    /// exposes no server-side methods, so these are only logged.
    ServerRequest {
        method: String,
        id: Option<RequestId>,
    },
}

/// Every field optional: the shape all inbound frames share.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    /// Kept raw so that a malformed error object still settles its call.
    #[serde(default)]
    error: Option<Value>,
}

impl TryFrom<RawFrame> for InboundFrame {
    type Error = ProtocolError;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        match raw.method {
            Some(method) if method == EVENT_METHOD => {
                let params = raw.params.ok_or_else(|| {
                    ProtocolError::InvalidMessage(
                        "event notification without params".into(),
                    )
                })?;
                let payload = serde_json::from_value(params).map_err(|e| {
                    ProtocolError::InvalidMessage(format!(
                        "bad event params: {e}"
                    ))
                })?;
                Ok(Self::Notification(payload))
            }
            Some(method) => Ok(Self::ServerRequest { method, id: raw.id }),
            None => {
                let id = raw.id.ok_or_else(|| {
                    ProtocolError::InvalidMessage(
                        "frame has neither method nor id".into(),
                    )
                })?;
                let outcome = match raw.error {
                    Some(error) => Err(ErrorPayload::from_value(error)),
                    None => Ok(raw.result.unwrap_or(Value::Null)),
                };
                Ok(Self::Response(Response { id, outcome }))
            }
        }
    }
}

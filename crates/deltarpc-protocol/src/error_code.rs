//! JSON-RPC error code classification.

use std::fmt;

/// The JSON-RPC 2.0 error taxonomy.
///
/// Classification is informational. It tags a server-reported failure
/// but never changes how that failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `-32700`: the server could not parse our JSON.
    ParseError,
    /// `-32600`: the JSON was not a valid request object.
    InvalidRequest,
    /// `-32601`: the method does not exist.
    MethodNotFound,
    /// `-32602`: invalid method parameters.
    InvalidParams,
    /// `-32603`: internal JSON-RPC error.
    InternalError,
    /// `-32099..=-32000`: reserved for implementation-defined server errors.
    ServerError,
    /// Any other code; application-defined.
    Custom,
}

impl ErrorKind {
    /// Range reserved for implementation-defined server errors.
    pub const SERVER_ERROR_RANGE: std::ops::RangeInclusive<i64> =
        -32099..=-32000;

    /// Maps a numeric error code to its kind. Total over `i64`.
    pub fn classify(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            c if Self::SERVER_ERROR_RANGE.contains(&c) => Self::ServerError,
            _ => Self::Custom,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParseError => "parse error",
            Self::InvalidRequest => "invalid request",
            Self::MethodNotFound => "method not found",
            Self::InvalidParams => "invalid params",
            Self::InternalError => "internal error",
            Self::ServerError => "server error",
            Self::Custom => "custom error",
        };
        f.write_str(s)
    }
}

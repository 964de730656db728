//! Wire protocol for deltarpc.
//!
//! This crate defines what the client and the backend say to each other:
//!
//! - **Frames** ([`Request`], [`InboundFrame`], [`Response`],
//!   [`EventPayload`], [`ErrorPayload`]): the JSON documents that travel
//!   in each WebSocket message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become text
//!   and bytes become frames.
//! - **Error codes** ([`ErrorKind`]): the JSON-RPC error taxonomy.
//! - **Event catalog** ([`EventKind`], [`resolve_name`], [`Event`]): what
//!   the numeric event-type ids mean.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the client
//! (pending calls and subscriptions). It knows nothing about sockets.
//!
//! ```text
//! Transport (text) → Protocol (InboundFrame) → Client (calls, events)
//! ```

mod codec;
mod error;
mod error_code;
mod events;
mod types;

pub use codec::Codec;
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use error_code::ErrorKind;
pub use events::{Event, EventKind, UnknownEventName, resolve_name};
pub use types::{
    EVENT_METHOD, ErrorPayload, EventPayload, InboundFrame, JSONRPC_VERSION,
    Request, RequestId, Response,
};

//! # deltarpc
//!
//! Client-side JSON-RPC runtime for a chat backend reached over a single
//! persistent WebSocket.
//!
//! A [`Client`] correlates each outgoing call with its response by request
//! id, demultiplexes the backend's `"event"` notifications to listeners
//! scoped globally or per account (context), and tracks the lifecycle of
//! its link. Typed method wrappers are meant to be layered on top of
//! [`Client::call`] / [`Client::request`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deltarpc::prelude::*;
//!
//! # async fn demo() -> Result<(), ClientError> {
//! let client = Client::builder().url("ws://localhost:20808/ws").build();
//!
//! client.on_global(EventKind::Warning, |event| {
//!     eprintln!("backend warning: {}", event.field2);
//! });
//! client.on_context(1, EventFilter::All, |event| {
//!     println!("account 1 saw {}", event.name());
//! });
//!
//! client.connect().await?;
//! let ids: Vec<u32> = client.request("get_all_account_ids", ()).await?;
//! # let _ = ids;
//! client.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

mod client;
mod config;
mod error;
mod pending;
mod state;
mod subscriptions;

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig, DEFAULT_URL};
pub use error::{ClientError, Diagnostic, RpcError};
pub use state::ConnectionState;
pub use subscriptions::{
    DispatchReport, EventFilter, Listener, Scope, SubscriptionId,
    Subscriptions,
};

pub use deltarpc_protocol::{
    ErrorKind, Event, EventKind, RequestId, UnknownEventName, resolve_name,
};
pub use deltarpc_transport::TransportError;

/// Locks a std mutex, recovering the data if a previous holder panicked.
///
/// No critical section in this crate leaves its data half-updated, so a
/// poisoned lock is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Common imports for client code.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ClientError, ConnectionState,
        Diagnostic, ErrorKind, Event, EventFilter, EventKind, RpcError,
        Scope, SubscriptionId,
    };
}

//! The call correlation table.
//!
//! Every outbound request parks a oneshot sender here under its
//! [`RequestId`]. The reader task completes the entry when the matching
//! response arrives; a dropped link fails every entry at once.
//!
//! # Concurrency note
//!
//! `PendingCalls` is a plain `HashMap`, not a concurrent one. The client
//! keeps it behind a mutex that is only ever held for the duration of a
//! single insert, remove, or drain. It never spans an `.await`.

use std::collections::HashMap;

use deltarpc_protocol::{RequestId, Response};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{ClientError, RpcError};

/// The outcome delivered to a waiting caller.
pub(crate) type CallOutcome = Result<Value, ClientError>;

/// In-flight calls keyed by request id.
pub(crate) struct PendingCalls {
    /// The id the next `register` hands out. Never reset, so ids stay
    /// unique across reconnects for the life of the client.
    next_id: RequestId,
    calls: HashMap<RequestId, oneshot::Sender<CallOutcome>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            next_id: RequestId::FIRST,
            calls: HashMap::new(),
        }
    }

    /// Allocates the next id and parks a completion for it.
    pub(crate) fn register(
        &mut self,
    ) -> (RequestId, oneshot::Receiver<CallOutcome>) {
        let id = self.next_id;
        self.next_id = id.next();

        let (tx, rx) = oneshot::channel();
        self.calls.insert(id, tx);
        (id, rx)
    }

    /// Drops the entry for a call that never made it onto the wire.
    pub(crate) fn cancel(&mut self, id: RequestId) -> bool {
        self.calls.remove(&id).is_some()
    }

    /// Delivers a response to its waiting caller and removes the entry.
    ///
    /// # Errors
    /// Returns [`ClientError::OrphanResponse`] if no call is pending
    /// under the response's id. Other pending calls are untouched.
    pub(crate) fn complete(
        &mut self,
        response: Response,
    ) -> Result<(), ClientError> {
        let tx = self
            .calls
            .remove(&response.id)
            .ok_or(ClientError::OrphanResponse(response.id))?;

        let outcome = response
            .outcome
            .map_err(|payload| ClientError::Rpc(RpcError::from(payload)));

        if tx.send(outcome).is_err() {
            // The caller stopped waiting (its future was dropped).
            tracing::debug!(id = %response.id, "caller gone, response discarded");
        }
        Ok(())
    }

    /// Fails every pending call with [`ClientError::ConnectionLost`].
    ///
    /// Returns how many calls were failed.
    pub(crate) fn fail_all(&mut self) -> usize {
        let count = self.calls.len();
        for (_, tx) in self.calls.drain() {
            let _ = tx.send(Err(ClientError::ConnectionLost));
        }
        count
    }

    /// Number of calls still waiting for a response.
    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }
}

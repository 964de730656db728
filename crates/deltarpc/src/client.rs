//! The public client: one link, one correlation table, one registry.
//!
//! A [`Client`] owns at most one WebSocket link at a time. Each link gets
//! a reader task that handles inbound frames strictly in arrival order:
//!
//! ```text
//! recv() → decode → Response      → PendingCalls::complete → caller wakes
//!                 → Notification  → Subscriptions::dispatch → listeners
//!                 → anything else → logged, broadcast as a Diagnostic
//! ```
//!
//! The link slot, connection state, and pending table only change while
//! the slot lock is held, so a disconnect fails every pending call and
//! flips the state in one step; a `call()` racing with it either lands in
//! the table before the drain or sees `NotConnected`.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use deltarpc_protocol::{Codec, Event, InboundFrame, JsonCodec, Request};
use deltarpc_transport::{
    CLOSE_NORMAL, CLOSE_REPLACED, Connection, ConnectionId, TransportError,
    WebSocketConnection,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::pending::PendingCalls;
use crate::{
    ClientBuilder, ClientConfig, ClientError, ConnectionState, Diagnostic,
    EventFilter, Scope, SubscriptionId, Subscriptions, lock,
};

/// An open link and the task reading from it.
struct Link {
    conn: Arc<WebSocketConnection>,
    reader: JoinHandle<()>,
}

impl Link {
    /// Sends a close frame and stops the reader.
    async fn shutdown(self, code: u16, reason: &str) {
        let id = self.conn.id();
        if let Err(e) = self.conn.close(code, reason).await {
            tracing::debug!(%id, error = %e, "close frame not sent");
        }
        self.reader.abort();
    }
}

struct Slot {
    state: ConnectionState,
    link: Option<Link>,
    /// Bumped by every `connect` and `close`. A dial may only install
    /// its link or move the state if the attempt it started is still
    /// the current one.
    attempt: u64,
}

struct Inner {
    config: ClientConfig,
    codec: JsonCodec,
    slot: Mutex<Slot>,
    pending: Mutex<PendingCalls>,
    subscriptions: Subscriptions,
    lifecycle: broadcast::Sender<ConnectionState>,
    diagnostics: broadcast::Sender<Diagnostic>,
}

impl Inner {
    /// Moves to `to` and announces it. Caller holds the slot lock.
    fn transition(&self, slot: &mut Slot, to: ConnectionState) {
        let from = slot.state;
        debug_assert!(
            from.can_transition_to(to),
            "illegal transition {from} -> {to}"
        );
        slot.state = to;
        tracing::info!(url = %self.config.url, %from, %to, "connection state changed");
        // Nobody listening is fine.
        let _ = self.lifecycle.send(to);
    }

    /// Takes the link out of the slot and fails every pending call.
    /// Caller holds the slot lock.
    fn detach(&self, slot: &mut Slot) -> Option<Link> {
        let link = slot.link.take();
        let failed = lock(&self.pending).fail_all();
        if failed > 0 {
            tracing::info!(failed, "pending calls failed: connection lost");
        }
        link
    }

    /// Called by a reader task when its link ends on its own.
    fn link_lost(&self, link_id: ConnectionId, reason: &str) {
        let mut slot = lock(&self.slot);
        let current = slot.link.as_ref().map(|link| link.conn.id());
        if current != Some(link_id) {
            // A link we already replaced or closed.
            tracing::debug!(%link_id, reason, "stale link ended");
            return;
        }

        tracing::info!(%link_id, reason, "link lost");
        // The returned handle is this very reader; dropping it detaches.
        drop(self.detach(&mut slot));
        self.transition(&mut slot, ConnectionState::Disconnected);
    }

    /// Handles one inbound frame.
    ///
    /// # Errors
    /// - [`ClientError::MalformedFrame`] if `data` does not decode
    /// - [`ClientError::OrphanResponse`] if a response matches no call
    fn handle_frame(&self, data: &[u8]) -> Result<(), ClientError> {
        let frame: InboundFrame = self
            .codec
            .decode(data)
            .map_err(|e| ClientError::MalformedFrame(e.to_string()))?;

        match frame {
            InboundFrame::Response(response) => {
                tracing::debug!(
                    id = %response.id,
                    ok = response.outcome.is_ok(),
                    "<-- response"
                );
                lock(&self.pending).complete(response)
            }
            InboundFrame::Notification(payload) => {
                let event = Event::from(payload);
                tracing::debug!(
                    event = event.name(),
                    context_id = event.context_id,
                    "<-- event"
                );
                let report = self.subscriptions.dispatch(&event);
                for subscription in report.panicked {
                    self.diagnose(Diagnostic::ListenerPanicked {
                        subscription,
                        event: event.kind,
                    });
                }
                Ok(())
            }
            InboundFrame::ServerRequest { method, id } => {
                tracing::warn!(
                    method = %method,
                    ?id,
                    "ignoring server request, client exposes no methods"
                );
                Ok(())
            }
        }
    }

    /// Logs a frame-handling failure and broadcasts it as a diagnostic.
    fn report(&self, error: ClientError) {
        let diagnostic = match error {
            ClientError::OrphanResponse(id) => {
                tracing::warn!(%id, "response for unknown request");
                Diagnostic::OrphanResponse(id)
            }
            ClientError::MalformedFrame(reason) => {
                tracing::warn!(%reason, "dropping malformed frame");
                Diagnostic::MalformedFrame(reason)
            }
            other => {
                tracing::warn!(error = %other, "frame handling failed");
                return;
            }
        };
        self.diagnose(diagnostic);
    }

    fn diagnose(&self, diagnostic: Diagnostic) {
        let _ = self.diagnostics.send(diagnostic);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(link) = slot.link.take() {
            link.reader.abort();
        }
    }
}

/// Reads frames from one link until it ends.
///
/// Holds only a weak reference, so dropping every `Client` handle stops
/// the task instead of leaking it.
async fn read_loop(inner: Weak<Inner>, conn: Arc<WebSocketConnection>) {
    let link_id = conn.id();
    let reason = loop {
        let received = conn.recv().await;
        let Some(strong) = inner.upgrade() else {
            return;
        };
        match received {
            Ok(Some(data)) => {
                if let Err(e) = strong.handle_frame(&data) {
                    strong.report(e);
                }
            }
            Ok(None) => break String::from("closed by peer"),
            Err(e) => break e.to_string(),
        }
    };

    if let Some(strong) = inner.upgrade() {
        strong.link_lost(link_id, &reason);
    }
}

/// A JSON-RPC client for the chat backend.
///
/// Cloning is cheap and every clone drives the same link, pending table,
/// and subscriptions.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), deltarpc::ClientError> {
/// use deltarpc::prelude::*;
///
/// let client = Client::new("ws://localhost:20808/ws");
/// client.on_global(EventKind::IncomingMsg, |event| {
///     println!("new message on account {}", event.context_id);
/// });
/// client.connect().await?;
/// let account_id = client.call("add_account", vec![]).await?;
/// # let _ = account_id;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Creates a disconnected client. Accepts a [`ClientConfig`] or a
    /// bare URL.
    pub fn new(config: impl Into<ClientConfig>) -> Self {
        let config = config.into();
        let (lifecycle, _) = broadcast::channel(config.lifecycle_capacity.max(1));
        let (diagnostics, _) =
            broadcast::channel(config.diagnostics_capacity.max(1));

        Self {
            inner: Arc::new(Inner {
                config,
                codec: JsonCodec,
                slot: Mutex::new(Slot {
                    state: ConnectionState::Disconnected,
                    link: None,
                    attempt: 0,
                }),
                pending: Mutex::new(PendingCalls::new()),
                subscriptions: Subscriptions::new(),
                lifecycle,
                diagnostics,
            }),
        }
    }

    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // -- Lifecycle --------------------------------------------------------

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        lock(&self.inner.slot).state
    }

    /// `true` while the link is open and calls are permitted.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribes to lifecycle transitions. Every state change is sent,
    /// including the intermediate `Closing` of a close or replace.
    pub fn connection_changes(&self) -> broadcast::Receiver<ConnectionState> {
        self.inner.lifecycle.subscribe()
    }

    /// Subscribes to protocol diagnostics (orphan responses, malformed
    /// frames, panicking listeners).
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.diagnostics.subscribe()
    }

    /// Opens the link.
    ///
    /// If a link is already open it is closed first (close code 4000)
    /// and its pending calls fail with [`ClientError::ConnectionLost`].
    ///
    /// # Errors
    /// - [`ClientError::ConnectInProgress`] if another connect is dialing
    /// - [`ClientError::Connect`] if the socket fails before it opens, or
    ///   `close()` is called while dialing (even if a later `connect`
    ///   has started since)
    pub async fn connect(&self) -> Result<(), ClientError> {
        let (replaced, attempt) = {
            let mut slot = lock(&self.inner.slot);
            let replaced = match slot.state {
                ConnectionState::Connecting => {
                    return Err(ClientError::ConnectInProgress);
                }
                ConnectionState::Connected => {
                    self.inner.transition(&mut slot, ConnectionState::Closing);
                    let old = self.inner.detach(&mut slot);
                    self.inner
                        .transition(&mut slot, ConnectionState::Disconnected);
                    old
                }
                ConnectionState::Disconnected | ConnectionState::Closing => {
                    None
                }
            };
            self.inner.transition(&mut slot, ConnectionState::Connecting);
            slot.attempt = slot.attempt.wrapping_add(1);
            (replaced, slot.attempt)
        };

        if let Some(old) = replaced {
            tracing::info!(link = %old.conn.id(), "replacing existing link");
            old.shutdown(CLOSE_REPLACED, "replaced by a new connection")
                .await;
        }

        let url = self.inner.config.url.as_str();
        tracing::info!(url, "connecting");
        let dialed =
            WebSocketConnection::connect(url, self.inner.config.connect_timeout)
                .await;

        let conn = match dialed {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                let mut slot = lock(&self.inner.slot);
                if slot.attempt == attempt {
                    self.inner
                        .transition(&mut slot, ConnectionState::Disconnected);
                }
                tracing::warn!(url, error = %e, "connect failed");
                return Err(ClientError::Connect(e));
            }
        };

        let installed = {
            let mut slot = lock(&self.inner.slot);
            if slot.attempt == attempt {
                let reader = tokio::spawn(read_loop(
                    Arc::downgrade(&self.inner),
                    Arc::clone(&conn),
                ));
                slot.link = Some(Link {
                    conn: Arc::clone(&conn),
                    reader,
                });
                self.inner.transition(&mut slot, ConnectionState::Connected);
                true
            } else {
                false
            }
        };

        if !installed {
            if let Err(e) = conn.close(CLOSE_NORMAL, "closed while connecting").await
            {
                tracing::debug!(error = %e, "close frame not sent");
            }
            return Err(ClientError::Connect(TransportError::ConnectionClosed(
                "client closed while connecting".into(),
            )));
        }

        tracing::info!(url, link = %conn.id(), "connected");
        Ok(())
    }

    /// Closes the link: `Closing`, fail pending calls, `Disconnected`,
    /// then send the close frame. A no-op when already disconnected.
    pub async fn close(&self) {
        let link = {
            let mut slot = lock(&self.inner.slot);
            // Supersedes any dial still in flight.
            slot.attempt = slot.attempt.wrapping_add(1);
            if slot.state == ConnectionState::Disconnected {
                return;
            }
            self.inner.transition(&mut slot, ConnectionState::Closing);
            let link = self.inner.detach(&mut slot);
            self.inner.transition(&mut slot, ConnectionState::Disconnected);
            link
        };

        if let Some(link) = link {
            link.shutdown(CLOSE_NORMAL, "client closed").await;
        }
    }

    // -- Calls ------------------------------------------------------------

    /// Invokes `method` with positional `params` and waits for its
    /// response. `null` and absent results both come back as
    /// `Value::Null`.
    ///
    /// # Errors
    /// - [`ClientError::NotConnected`] if the link is not open (nothing
    ///   is queued)
    /// - [`ClientError::Rpc`] if the backend answered with an error
    /// - [`ClientError::ConnectionLost`] if the link dropped first
    /// - [`ClientError::Transport`] if the request could not be sent
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ClientError> {
        let (conn, id, rx) = {
            let slot = lock(&self.inner.slot);
            let link = match (slot.state, slot.link.as_ref()) {
                (ConnectionState::Connected, Some(link)) => link,
                _ => return Err(ClientError::NotConnected),
            };
            let (id, rx) = lock(&self.inner.pending).register();
            (Arc::clone(&link.conn), id, rx)
        };

        let request = Request::new(id, method, params);
        let text = match self.inner.codec.encode(&request) {
            Ok(text) => text,
            Err(e) => {
                lock(&self.inner.pending).cancel(id);
                return Err(e.into());
            }
        };

        tracing::debug!(%id, method, "--> request");
        if let Err(e) = conn.send(&text).await {
            // If the entry is already gone the link dropped under us and
            // the receiver holds the real outcome.
            if lock(&self.inner.pending).cancel(id) {
                return Err(ClientError::Transport(e));
            }
        }

        rx.await.unwrap_or(Err(ClientError::ConnectionLost))
    }

    /// Typed convenience over [`call`](Self::call).
    ///
    /// `params` must serialize to a JSON array (a tuple or `Vec`); `()`
    /// sends no params and any other single value is sent as the only
    /// positional param.
    pub async fn request<P, R>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, ClientError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = match serde_json::to_value(params)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            single => vec![single],
        };
        let result = self.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Number of calls still waiting for a response.
    pub fn pending_calls(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    // -- Events -----------------------------------------------------------

    /// Subscribes `listener` to `filter` within `scope`.
    pub fn on<F>(
        &self,
        filter: impl Into<EventFilter>,
        scope: Scope,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner
            .subscriptions
            .subscribe(filter.into(), scope, false, Arc::new(listener))
    }

    /// Subscribes to `filter` for events from every context.
    pub fn on_global<F>(
        &self,
        filter: impl Into<EventFilter>,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.on(filter, Scope::Global, listener)
    }

    /// Subscribes to `filter` for events of one context only.
    pub fn on_context<F>(
        &self,
        context_id: u32,
        filter: impl Into<EventFilter>,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.on(filter, Scope::Context(context_id), listener)
    }

    /// Like [`on`](Self::on), but the subscription removes itself after
    /// its first delivery.
    pub fn once<F>(
        &self,
        filter: impl Into<EventFilter>,
        scope: Scope,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner
            .subscriptions
            .subscribe(filter.into(), scope, true, Arc::new(listener))
    }

    /// Removes a subscription. Returns `false` if it no longer exists.
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.inner.subscriptions.unsubscribe(id)
    }

    /// Drops every listener scoped to `context_id` and frees its set.
    pub fn release_context(&self, context_id: u32) -> usize {
        self.inner.subscriptions.release_context(context_id)
    }

    /// The subscription registry, for inspection.
    pub fn subscriptions(&self) -> &Subscriptions {
        &self.inner.subscriptions
    }

    /// Waits for the next event matching `filter` within `scope`.
    ///
    /// Does not time out and survives reconnects; wrap it in
    /// `tokio::time::timeout` if needed. Dropping the future removes the
    /// subscription.
    ///
    /// # Errors
    /// [`ClientError::SubscriptionDropped`] if the one-shot subscription
    /// is removed first (for example by `release_context`).
    pub async fn wait_for_event(
        &self,
        filter: impl Into<EventFilter>,
        scope: Scope,
    ) -> Result<Event, ClientError> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let id = self.inner.subscriptions.subscribe(
            filter.into(),
            scope,
            true,
            Arc::new(move |event: &Event| {
                if let Some(tx) = lock(&tx).take() {
                    let _ = tx.send(event.clone());
                }
            }),
        );
        let _guard = Unsubscribe {
            subscriptions: &self.inner.subscriptions,
            id,
        };
        rx.await.map_err(|_| ClientError::SubscriptionDropped)
    }
}

/// Removes a subscription when dropped. A no-op if it already fired.
struct Unsubscribe<'a> {
    subscriptions: &'a Subscriptions,
    id: SubscriptionId,
}

impl Drop for Unsubscribe<'_> {
    fn drop(&mut self) {
        self.subscriptions.unsubscribe(self.id);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the frame-handling path. These feed raw frames to
    //! `Inner::handle_frame` directly, without a socket; the end-to-end
    //! paths live in `tests/client.rs`.

    use std::sync::Mutex as StdMutex;

    use std::time::Duration;

    use deltarpc_protocol::{ErrorKind, EventKind, RequestId};
    use serde_json::json;

    use super::*;

    fn client() -> Client {
        Client::new("ws://127.0.0.1:1/ws")
    }

    fn panicking(_: &Event) {
        panic!("boom");
    }

    #[tokio::test]
    async fn test_call_before_connect_fails_not_connected() {
        let client = client();

        let result = client.call("add_account", vec![]).await;

        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert_eq!(client.pending_calls(), 0, "nothing queued");
    }

    #[tokio::test]
    async fn test_close_when_disconnected_is_noop() {
        let client = client();
        let mut changes = client.connection_changes();

        client.close().await;

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(changes.try_recv().is_err(), "no transition emitted");
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = client();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_handle_frame_response_completes_pending_call() {
        let client = client();
        let (id, mut rx) = lock(&client.inner.pending).register();

        let frame = json!({ "id": id, "result": 7 }).to_string();
        client.inner.handle_frame(frame.as_bytes()).unwrap();

        assert_eq!(rx.try_recv().unwrap().unwrap(), json!(7));
    }

    #[test]
    fn test_handle_frame_error_without_message_rejects_pending_call() {
        let client = client();
        let (id, mut rx) = lock(&client.inner.pending).register();

        let frame = json!({ "id": id, "error": { "code": -32601 } }).to_string();
        client.inner.handle_frame(frame.as_bytes()).unwrap();

        match rx.try_recv().unwrap() {
            Err(ClientError::Rpc(e)) => {
                assert_eq!(e.kind, ErrorKind::MethodNotFound);
                assert_eq!(e.message, "");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
        assert_eq!(client.pending_calls(), 0);
    }

    #[test]
    fn test_handle_frame_string_error_rejects_pending_call() {
        let client = client();
        let (id, mut rx) = lock(&client.inner.pending).register();

        let frame = json!({ "id": id, "error": "boom" }).to_string();
        client.inner.handle_frame(frame.as_bytes()).unwrap();

        match rx.try_recv().unwrap() {
            Err(ClientError::Rpc(e)) => {
                assert_eq!(e.kind, ErrorKind::Custom);
                assert_eq!(e.message, "boom");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
        assert_eq!(client.pending_calls(), 0);
    }

    #[test]
    fn test_handle_frame_orphan_is_reported_as_diagnostic() {
        let client = client();
        let mut diagnostics = client.diagnostics();

        let err = client
            .inner
            .handle_frame(br#"{"id":55,"result":1}"#)
            .unwrap_err();
        client.inner.report(err);

        assert_eq!(
            diagnostics.try_recv().unwrap(),
            Diagnostic::OrphanResponse(RequestId(55))
        );
    }

    #[test]
    fn test_handle_frame_malformed_is_reported_and_later_frames_still_work() {
        let client = client();
        let mut diagnostics = client.diagnostics();
        let (id, mut rx) = lock(&client.inner.pending).register();

        let err = client.inner.handle_frame(b"<html>").unwrap_err();
        assert!(matches!(err, ClientError::MalformedFrame(_)));
        client.inner.report(err);

        let frame = json!({ "id": id, "result": "ok" }).to_string();
        client.inner.handle_frame(frame.as_bytes()).unwrap();

        assert!(matches!(
            diagnostics.try_recv().unwrap(),
            Diagnostic::MalformedFrame(_)
        ));
        assert_eq!(rx.try_recv().unwrap().unwrap(), json!("ok"));
    }

    #[test]
    fn test_handle_frame_event_reaches_listener_with_resolved_name() {
        let client = client();
        let seen: Arc<StdMutex<Vec<(String, u32, Value)>>> = Arc::default();
        {
            let seen = Arc::clone(&seen);
            client.on_context(5, EventKind::IncomingMsg, move |event| {
                seen.lock().unwrap().push((
                    event.name().to_string(),
                    event.context_id,
                    event.field2.clone(),
                ));
            });
        }

        client
            .inner
            .handle_frame(
                br#"{"method":"event","params":{"id":2005,"contextId":5,"field1":12,"field2":99}}"#,
            )
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("INCOMING_MSG".to_string(), 5, json!(99))]
        );
    }

    #[test]
    fn test_handle_frame_unknown_event_id_does_not_block_next_event() {
        let client = client();
        let names: Arc<StdMutex<Vec<&'static str>>> = Arc::default();
        {
            let names = Arc::clone(&names);
            client.on_global(EventFilter::All, move |event| {
                names.lock().unwrap().push(event.name());
            });
        }

        for frame in [
            br#"{"method":"event","params":{"id":424242,"contextId":1}}"#.as_slice(),
            br#"{"method":"event","params":{"id":300,"contextId":1}}"#.as_slice(),
        ] {
            client.inner.handle_frame(frame).unwrap();
        }

        assert_eq!(*names.lock().unwrap(), vec!["UNKNOWN", "WARNING"]);
    }

    #[test]
    fn test_handle_frame_panicking_listener_becomes_diagnostic() {
        let client = client();
        let mut diagnostics = client.diagnostics();
        let id = client.on_global(EventKind::Error, panicking);

        client
            .inner
            .handle_frame(br#"{"method":"event","params":{"id":400,"contextId":0}}"#)
            .unwrap();

        assert_eq!(
            diagnostics.try_recv().unwrap(),
            Diagnostic::ListenerPanicked {
                subscription: id,
                event: EventKind::Error,
            }
        );
    }

    #[test]
    fn test_handle_frame_server_request_is_ignored() {
        let client = client();
        let mut diagnostics = client.diagnostics();

        client
            .inner
            .handle_frame(br#"{"jsonrpc":"2.0","method":"ping","id":1}"#)
            .unwrap();

        assert!(diagnostics.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wait_for_event_resolves_on_first_match() {
        let client = client();
        let waiter = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .wait_for_event(EventKind::ConfigureProgress, Scope::Context(2))
                    .await
            })
        };
        // Let the waiter register before the event arrives.
        while client.subscriptions().is_empty() {
            tokio::task::yield_now().await;
        }

        client
            .inner
            .handle_frame(
                br#"{"method":"event","params":{"id":2041,"contextId":2,"field1":1000}}"#,
            )
            .unwrap();

        let event = waiter.await.unwrap().unwrap();
        assert_eq!(event.kind, EventKind::ConfigureProgress);
        assert_eq!(event.field1, json!(1000));
        assert!(client.subscriptions().is_empty(), "one-shot removed");
    }

    #[tokio::test]
    async fn test_wait_for_event_fails_when_context_released() {
        let client = client();
        let waiter = {
            let client = client.clone();
            tokio::spawn(async move {
                client.wait_for_event(EventFilter::All, Scope::Context(8)).await
            })
        };
        while client.subscriptions().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(client.release_context(8), 1);

        assert!(matches!(
            waiter.await.unwrap(),
            Err(ClientError::SubscriptionDropped)
        ));
    }

    #[tokio::test]
    async fn test_wait_for_event_timed_out_removes_subscription() {
        let client = client();

        for _ in 0..3 {
            let waited = tokio::time::timeout(
                Duration::from_millis(10),
                client.wait_for_event(EventKind::IncomingMsg, Scope::Context(9)),
            )
            .await;
            assert!(waited.is_err(), "no event was sent");
        }

        assert!(client.subscriptions().is_empty());
    }
}

//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to a WebDriver BiDi remote
//! end, including command/response correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the remote end (responses, events)
//! - Outgoing command frames queued by callers
//! - Response correlation by command id
//! - Event delivery through the [`EventDispatcher`]
//!
//! # Correlation
//!
//! Allocating an id, inserting it into the pending table and queueing the
//! frame happen under one lock, so a response can never arrive before its
//! waiter exists, and frames leave in id order.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::codec::{Codec, MalformedMessage};
use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::{BidiCommand, Command, Message};

use super::EventDispatcher;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for opening the WebSocket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending commands before rejecting new ones.
pub const DEFAULT_MAX_PENDING: usize = 1024;

// ============================================================================
// ConnectionOptions
// ============================================================================

/// Transport limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// How long a caller waits for a response.
    pub command_timeout: Duration,
    /// How long opening the WebSocket may take.
    pub connect_timeout: Duration,
    /// Pending table capacity.
    pub max_pending: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// A command awaiting its response.
struct Pending {
    /// `None` once the caller stopped waiting; the entry stays until the
    /// response arrives so it is consumed rather than reported as unknown.
    waiter: Option<oneshot::Sender<Result<Value>>>,
    method: &'static str,
}

/// State guarded by the correlation lock.
struct PendingTable {
    next_id: CommandId,
    pending: FxHashMap<CommandId, Pending>,
    closed: bool,
}

/// Frames queued for the event loop.
enum Outbound {
    /// Serialized command frame.
    Frame(String),
    /// Close the socket.
    Close,
}

/// State shared between handles and the event loop.
struct Shared {
    table: Mutex<PendingTable>,
    codec: Arc<Codec>,
    dispatcher: Arc<EventDispatcher>,
    options: ConnectionOptions,
    closed_tx: watch::Sender<bool>,
}

impl Shared {
    /// Completes the waiter for `id`, if any.
    fn complete(&self, id: CommandId, result: Result<Value>) {
        let entry = self.table.lock().pending.remove(&id);

        match entry {
            Some(Pending {
                waiter: Some(tx),
                method,
            }) => {
                trace!(%id, method, ok = result.is_ok(), "Command completed");
                let _ = tx.send(result);
            }
            Some(Pending { waiter: None, method }) => {
                debug!(%id, method, "Consumed response for abandoned command");
            }
            None => {
                warn!(%id, "Response for unknown command id");
            }
        }
    }

    /// Stops waiting for `id` without freeing its entry.
    fn abandon(&self, id: CommandId) {
        if let Some(entry) = self.table.lock().pending.get_mut(&id) {
            entry.waiter = None;
        }
    }

    /// Marks the transport dead and fails every waiter.
    fn shutdown(&self) {
        let drained: Vec<_> = {
            let mut table = self.table.lock();
            table.closed = true;
            table.pending.drain().collect()
        };

        let mut failed = 0usize;
        for (_, pending) in drained {
            if let Some(tx) = pending.waiter {
                let _ = tx.send(Err(Error::TransportClosed));
                failed += 1;
            }
        }

        if failed > 0 {
            debug!(failed, "Failed pending commands on shutdown");
        }

        self.closed_tx.send_replace(true);
    }
}

// ============================================================================
// PendingResponse
// ============================================================================

/// A registered command whose response has not been awaited yet.
pub struct PendingResponse {
    id: CommandId,
    method: &'static str,
    rx: oneshot::Receiver<Result<Value>>,
    shared: Arc<Shared>,
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("id", &self.id)
            .field("method", &self.method)
            .finish()
    }
}

impl PendingResponse {
    /// Returns the command id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Returns the command method.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Waits for the raw result.
    ///
    /// On timeout the pending entry is kept so the late response is still
    /// consumed by the reader.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::TransportClosed`] if the socket closes first
    /// - [`Error::Protocol`] if the remote end answers with an error
    pub async fn wait(self, request_timeout: Duration) -> Result<Value> {
        match timeout(request_timeout, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::TransportClosed),
            Err(_) => {
                self.shared.abandon(self.id);
                warn!(id = %self.id, method = self.method, "Command timed out");
                Err(Error::request_timeout(
                    self.id,
                    self.method,
                    duration_ms(request_timeout),
                ))
            }
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a BiDi remote end.
///
/// Handles command correlation and event routing. The connection spawns an
/// internal event loop task that owns the socket.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone. The event loop ends when
/// the socket closes, when [`Connection::close`] is called, or when every
/// handle is dropped.
#[derive(Clone)]
pub struct Connection {
    /// Channel for queueing frames to the event loop.
    frame_tx: mpsc::UnboundedSender<Outbound>,
    /// State shared with the event loop.
    shared: Arc<Shared>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Opens a WebSocket to `endpoint` and starts the event loop.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the endpoint is not a `ws://`/`wss://` URL
    ///   or the handshake fails
    /// - [`Error::ConnectionTimeout`] if the handshake takes too long
    pub async fn connect(
        endpoint: &str,
        codec: Arc<Codec>,
        dispatcher: Arc<EventDispatcher>,
        options: ConnectionOptions,
    ) -> Result<Self> {
        let url = parse_endpoint(endpoint)?;

        debug!(endpoint = %url, "Connecting");

        let (ws_stream, response) = timeout(options.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(duration_ms(options.connect_timeout)))?
            .map_err(|e| Error::connection(format!("{url}: {e}")))?;

        debug!(endpoint = %url, status = %response.status(), "WebSocket connected");

        Ok(Self::from_stream(ws_stream, codec, dispatcher, options))
    }

    /// Wraps an already open WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub fn from_stream<S>(
        ws_stream: WebSocketStream<S>,
        codec: Arc<Codec>,
        dispatcher: Arc<EventDispatcher>,
        options: ConnectionOptions,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (closed_tx, _) = watch::channel(false);

        let shared = Arc::new(Shared {
            table: Mutex::new(PendingTable {
                next_id: CommandId::new(1),
                pending: FxHashMap::default(),
                closed: false,
            }),
            codec,
            dispatcher,
            options,
            closed_tx,
        });

        tokio::spawn(Self::run_event_loop(ws_stream, frame_rx, Arc::clone(&shared)));

        Self { frame_tx, shared }
    }

    /// Returns the codec frames are encoded with.
    #[inline]
    #[must_use]
    pub fn codec(&self) -> &Arc<Codec> {
        &self.shared.codec
    }

    /// Returns the transport limits.
    #[inline]
    #[must_use]
    pub fn options(&self) -> ConnectionOptions {
        self.shared.options
    }

    /// Sends a typed command and decodes its result, with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_with_timeout`].
    pub async fn send<C: BidiCommand>(&self, params: C) -> Result<C::Output> {
        self.send_with_timeout(params, self.shared.options.command_timeout)
            .await
    }

    /// Sends a typed command and decodes its result.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportClosed`] if the connection is closed
    /// - [`Error::TooManyPending`] if the pending table is full
    /// - [`Error::RequestTimeout`] if no response arrives within `request_timeout`
    /// - [`Error::Protocol`] if the remote end answers with an error
    /// - decode errors if the result has an unexpected shape
    pub async fn send_with_timeout<C: BidiCommand>(
        &self,
        params: C,
        request_timeout: Duration,
    ) -> Result<C::Output> {
        let value = self
            .send_command(params.into(), request_timeout)
            .await?;
        self.shared.codec.decode(value)
    }

    /// Sends an untyped command and returns the raw result.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send_with_timeout`], minus result decoding.
    pub async fn send_command(&self, command: Command, request_timeout: Duration) -> Result<Value> {
        self.register(&command)?.wait(request_timeout).await
    }

    /// Allocates an id, registers the waiter and queues the frame.
    ///
    /// # Errors
    ///
    /// - [`Error::TransportClosed`] if the connection is closed
    /// - [`Error::TooManyPending`] if the pending table is full
    /// - [`Error::Json`] if the params fail to serialize
    pub fn register(&self, command: &Command) -> Result<PendingResponse> {
        let method = command.method();
        let mut table = self.shared.table.lock();

        if table.closed {
            return Err(Error::TransportClosed);
        }

        let limit = self.shared.options.max_pending;
        if table.pending.len() >= limit {
            warn!(pending = table.pending.len(), limit, method, "Too many pending commands");
            return Err(Error::TooManyPending {
                pending: table.pending.len(),
                limit,
            });
        }

        let id = table.next_id;
        let frame = self.shared.codec.encode_command(id, command)?;
        table.next_id = id.next();

        let (tx, rx) = oneshot::channel();
        table.pending.insert(
            id,
            Pending {
                waiter: Some(tx),
                method,
            },
        );

        if self.frame_tx.send(Outbound::Frame(frame)).is_err() {
            table.pending.remove(&id);
            table.closed = true;
            return Err(Error::TransportClosed);
        }

        trace!(%id, method, "Command queued");

        Ok(PendingResponse {
            id,
            method,
            rx,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Fails every waiting caller with `make_error()`.
    ///
    /// Entries stay in the table so their responses are still consumed.
    /// Returns the number of callers failed.
    pub fn fail_pending(&self, make_error: impl Fn() -> Error) -> usize {
        let waiters: Vec<_> = {
            let mut table = self.shared.table.lock();
            table
                .pending
                .values_mut()
                .filter_map(|pending| pending.waiter.take())
                .collect()
        };

        let count = waiters.len();
        for tx in waiters {
            let _ = tx.send(Err(make_error()));
        }
        count
    }

    /// Returns the number of pending commands, abandoned ones included.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.table.lock().pending.len()
    }

    /// Returns `true` once the transport is dead.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.table.lock().closed
    }

    /// Returns a receiver that flips to `true` when the transport dies.
    #[must_use]
    pub fn closed_receiver(&self) -> watch::Receiver<bool> {
        self.shared.closed_tx.subscribe()
    }

    /// Waits until the transport is dead.
    pub async fn closed(&self) {
        let mut rx = self.closed_receiver();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Closes the socket. Pending commands fail with [`Error::TransportClosed`].
    pub fn close(&self) {
        let _ = self.frame_tx.send(Outbound::Close);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut frame_rx: mpsc::UnboundedReceiver<Outbound>,
        shared: Arc<Shared>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Frames from the remote end
                message = ws_read.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            Self::handle_incoming_frame(&shared, text.as_str());
                        }

                        Some(Ok(WsMessage::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => Self::handle_incoming_frame(&shared, text),
                            Err(_) => warn!(len = bytes.len(), "Dropping non-UTF-8 binary frame"),
                        },

                        Some(Ok(WsMessage::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ping/Pong are answered by tungstenite
                        _ => {}
                    }
                }

                // Frames queued by callers
                outbound = frame_rx.recv() => {
                    match outbound {
                        Some(Outbound::Frame(text)) => {
                            trace!(len = text.len(), "Sending frame");
                            if let Err(e) = ws_write.send(WsMessage::Text(text.into())).await {
                                error!(error = %e, "Failed to write frame");
                                break;
                            }
                        }

                        Some(Outbound::Close) => {
                            debug!("Close requested");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("All connection handles dropped");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        shared.shutdown();

        debug!("Event loop terminated");
    }

    /// Routes one inbound frame.
    fn handle_incoming_frame(shared: &Shared, text: &str) {
        trace!(len = text.len(), "Frame received");

        match shared.codec.decode_message(text) {
            Ok(Message::Success(success)) => {
                shared.complete(success.id, Ok(success.result));
            }

            Ok(Message::Error(response)) => match response.id {
                Some(id) => shared.complete(id, Err(response.into_error())),
                None => warn!(
                    error = %response.error,
                    message = %response.message,
                    "Error response without id"
                ),
            },

            Ok(Message::Event(event)) => {
                shared.dispatcher.dispatch(event.method, event.params);
            }

            Err(MalformedMessage { id: Some(id), error }) => {
                warn!(%id, error = %error, "Malformed response frame");
                shared.complete(id, Err(error));
            }

            Err(MalformedMessage { id: None, error }) => {
                warn!(error = %error, "Dropping malformed frame");
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Validates a WebSocket endpoint URL.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::connection(format!("invalid endpoint {endpoint:?}: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(Error::connection(format!(
            "unsupported endpoint scheme {other:?}; expected ws or wss"
        ))),
    }
}

/// Milliseconds in `duration`, saturating.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::protocol::browsing_context::GetTree;
    use crate::protocol::session;
    use crate::testing::MockRemote;

    async fn connect(remote: &MockRemote) -> (Connection, Arc<EventDispatcher>) {
        connect_with(remote, ConnectionOptions::default()).await
    }

    async fn connect_with(
        remote: &MockRemote,
        options: ConnectionOptions,
    ) -> (Connection, Arc<EventDispatcher>) {
        let codec = Arc::new(Codec::new());
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&codec)));
        let connection = assert_ok!(
            Connection::connect(&remote.endpoint(), codec, Arc::clone(&dispatcher), options).await
        );
        (connection, dispatcher)
    }

    #[test]
    fn test_defaults() {
        let options = ConnectionOptions::default();
        assert_eq!(options.command_timeout.as_secs(), 30);
        assert_eq!(options.connect_timeout.as_secs(), 30);
        assert_eq!(options.max_pending, 1024);
    }

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("ws://127.0.0.1:9222/session").is_ok());
        assert!(parse_endpoint("wss://grid.test/session/abc").is_ok());
        assert!(matches!(
            parse_endpoint("http://127.0.0.1:9222"),
            Err(Error::Connection { .. })
        ));
        assert!(matches!(parse_endpoint("not a url"), Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let codec = Arc::new(Codec::new());
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&codec)));
        // Port 1 on localhost is reserved and not listening.
        let result = Connection::connect(
            "ws://127.0.0.1:1/",
            codec,
            dispatcher,
            ConnectionOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn test_send_receives_typed_result() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(session::Status {}).await }
        });

        let command = remote.recv().await;
        assert_eq!(command["method"], "session.status");
        assert_eq!(command["params"], json!({}));
        remote
            .success(&command, json!({ "ready": true, "message": "ok" }))
            .await;

        let status = assert_ok!(request.await.expect("join"));
        assert!(status.ready);
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_reverse_order_responses_correlate() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let first = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let a = remote.recv().await;
        let second = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let b = remote.recv().await;

        // Answer B before A, each with a distinguishable tree.
        remote
            .success(&b, json!({ "contexts": [{ "context": "b", "url": "about:blank" }] }))
            .await;
        remote
            .success(&a, json!({ "contexts": [{ "context": "a", "url": "about:blank" }] }))
            .await;

        let first = assert_ok!(first.await.expect("join"));
        let second = assert_ok!(second.await.expect("join"));
        assert_eq!(first.contexts[0].context.as_str(), "a");
        assert_eq!(second.contexts[0].context.as_str(), "b");
    }

    #[tokio::test]
    async fn test_concurrent_ids_are_unique_and_increasing() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let connection = connection.clone();
                tokio::spawn(async move { connection.send(session::Status {}).await })
            })
            .collect();

        let mut ids = Vec::new();
        for _ in 0..16 {
            let command = remote.recv().await;
            ids.push(command["id"].as_u64().expect("numeric id"));
            remote
                .success(&command, json!({ "ready": true, "message": "" }))
                .await;
        }

        for task in tasks {
            assert_ok!(task.await.expect("join"));
        }

        let unique: BTreeSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 16);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "wire order follows id order: {ids:?}");
    }

    #[tokio::test]
    async fn test_unknown_id_is_dropped() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(session::Status {}).await }
        });
        let command = remote.recv().await;

        remote
            .send_json(json!({ "type": "success", "id": 9999, "result": {} }))
            .await;
        remote
            .success(&command, json!({ "ready": false, "message": "busy" }))
            .await;

        let status = assert_ok!(request.await.expect("join"));
        assert!(!status.ready);
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_error_response_maps_to_protocol_error() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let command = remote.recv().await;
        remote
            .error(&command, "no such frame", "context gone")
            .await;

        let err = request.await.expect("join").unwrap_err();
        assert_eq!(err.code(), Some(crate::ErrorCode::NoSuchFrame));
    }

    #[tokio::test]
    async fn test_malformed_result_fails_only_that_command() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let bad = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let command = remote.recv().await;
        remote.success(&command, json!({ "contexts": 5 })).await;
        assert!(bad.await.expect("join").unwrap_err().is_decode_error());

        let good = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let command = remote.recv().await;
        remote.success(&command, json!({ "contexts": [] })).await;
        assert_ok!(good.await.expect("join"));
    }

    #[tokio::test]
    async fn test_socket_close_fails_pending() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let _command = remote.recv().await;
        remote.close().await;

        let err = request.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::TransportClosed));

        connection.closed().await;
        assert!(connection.is_closed());
        assert!(matches!(
            connection.send(GetTree::default()).await,
            Err(Error::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn test_timeout_keeps_entry_until_late_response() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let err = connection
            .send_with_timeout(GetTree::default(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RequestTimeout { .. }));
        assert!(err.is_recoverable());
        assert_eq!(connection.pending_count(), 1);

        let command = remote.recv().await;
        remote.success(&command, json!({ "contexts": [] })).await;

        // A follow-up round trip guarantees the late response was read first.
        let follow_up = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(session::Status {}).await }
        });
        let command = remote.recv().await;
        remote
            .success(&command, json!({ "ready": true, "message": "" }))
            .await;
        assert_ok!(follow_up.await.expect("join"));

        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_too_many_pending() {
        let mut remote = MockRemote::start().await;
        let options = ConnectionOptions {
            max_pending: 1,
            ..ConnectionOptions::default()
        };
        let (connection, _) = connect_with(&remote, options).await;

        let _first = assert_ok!(connection.register(&GetTree::default().into()));
        let err = connection
            .register(&GetTree::default().into())
            .unwrap_err();
        assert!(matches!(err, Error::TooManyPending { pending: 1, limit: 1 }));

        let _ = remote.recv().await;
    }

    #[tokio::test]
    async fn test_events_reach_dispatcher_in_order() {
        let mut remote = MockRemote::start().await;
        let (connection, dispatcher) = connect(&remote).await;

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        dispatcher.on_any(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(session::Status {}).await }
        });
        let command = remote.recv().await;

        remote
            .event("vendor.ping", json!({}))
            .await;
        remote
            .event(
                "browsingContext.load",
                json!({ "context": "c", "navigation": "n", "timestamp": 0, "url": "about:blank" }),
            )
            .await;
        remote
            .success(&command, json!({ "ready": true, "message": "" }))
            .await;

        // Single reader: both events were delivered before the response.
        assert_ok!(request.await.expect("join"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fail_pending_keeps_entries() {
        let mut remote = MockRemote::start().await;
        let (connection, _) = connect(&remote).await;

        let request = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send(GetTree::default()).await }
        });
        let _command = remote.recv().await;

        assert_eq!(connection.fail_pending(|| Error::SessionEnded), 1);
        assert!(matches!(request.await.expect("join"), Err(Error::SessionEnded)));
        assert_eq!(connection.pending_count(), 1);

        connection.close();
        connection.closed().await;
        assert_eq!(connection.pending_count(), 0);
    }
}

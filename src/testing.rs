//! Scripted remote end for tests.
//!
//! Binds a localhost listener, accepts one WebSocket and lets a test read
//! the commands the local end sends and write back responses and events.

// ============================================================================
// Imports
// ============================================================================

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, accept_async};

use crate::codec::Codec;
use crate::error::Error;
use crate::protocol::session::CapabilitiesRequest;
use crate::session::{Session, SessionState};
use crate::transport::ConnectionOptions;

// ============================================================================
// Constants
// ============================================================================

/// How long a test waits for the next frame before failing.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// MockRemote
// ============================================================================

/// One-connection WebSocket server driven by the test.
pub(crate) struct MockRemote {
    addr: SocketAddr,
    accepted: Option<oneshot::Receiver<WebSocketStream<TcpStream>>>,
    ws: Option<WebSocketStream<TcpStream>>,
}

impl MockRemote {
    /// Binds to a random localhost port and starts accepting.
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind mock remote");
        let addr = listener.local_addr().expect("local addr");

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await
                && let Ok(ws) = accept_async(stream).await
            {
                let _ = tx.send(ws);
            }
        });

        Self {
            addr,
            accepted: Some(rx),
            ws: None,
        }
    }

    /// Returns the `ws://` endpoint to connect to.
    pub(crate) fn endpoint(&self) -> String {
        format!("ws://{}/session", self.addr)
    }

    async fn stream(&mut self) -> &mut WebSocketStream<TcpStream> {
        if self.ws.is_none() {
            let rx = self.accepted.take().expect("mock remote already failed");
            let ws = timeout(RECV_TIMEOUT, rx)
                .await
                .expect("local end never connected")
                .expect("accept failed");
            self.ws = Some(ws);
        }
        self.ws.as_mut().expect("stream present")
    }

    /// Reads the next command frame.
    pub(crate) async fn recv(&mut self) -> Value {
        let ws = self.stream().await;
        loop {
            let message = timeout(RECV_TIMEOUT, ws.next())
                .await
                .expect("timed out waiting for a command")
                .expect("socket ended")
                .expect("socket error");

            if let WsMessage::Text(text) = message {
                return serde_json::from_str(text.as_str()).expect("command is JSON");
            }
        }
    }

    /// Reads the next command and asserts its method.
    pub(crate) async fn expect(&mut self, method: &str) -> Value {
        let command = self.recv().await;
        assert_eq!(command["method"], method, "unexpected command: {command}");
        command
    }

    /// Writes a raw JSON frame.
    pub(crate) async fn send_json(&mut self, frame: Value) {
        self.stream()
            .await
            .send(WsMessage::Text(frame.to_string().into()))
            .await
            .expect("write frame");
    }

    /// Answers `command` with a success frame.
    pub(crate) async fn success(&mut self, command: &Value, result: Value) {
        let frame = json!({ "type": "success", "id": command["id"], "result": result });
        self.send_json(frame).await;
    }

    /// Answers `command` with an error frame.
    pub(crate) async fn error(&mut self, command: &Value, code: &str, message: &str) {
        let frame = json!({
            "type": "error",
            "id": command["id"],
            "error": code,
            "message": message,
        });
        self.send_json(frame).await;
    }

    /// Pushes an event frame.
    pub(crate) async fn event(&mut self, method: &str, params: Value) {
        let frame = json!({ "type": "event", "method": method, "params": params });
        self.send_json(frame).await;
    }

    /// Reads the next command, asserts its method and answers it.
    pub(crate) async fn reply(&mut self, method: &str, result: Value) -> Value {
        let command = self.expect(method).await;
        self.success(&command, result).await;
        command
    }

    /// Closes the socket from the remote side.
    pub(crate) async fn close(&mut self) {
        let _ = self.stream().await.close(None).await;
    }
}

// ============================================================================
// Session Helpers
// ============================================================================

/// `session.new` result the mock answers with.
pub(crate) fn new_session_result() -> Value {
    json!({
        "sessionId": "session-1",
        "capabilities": {
            "acceptInsecureCerts": false,
            "browserName": "firefox",
            "browserVersion": "140.0",
            "platformName": "linux",
            "setWindowRect": true,
            "userAgent": "Mozilla/5.0",
            "moz:profile": "/tmp/profile"
        }
    })
}

/// Connects a session to `remote` and establishes it.
pub(crate) async fn active_session(remote: &mut MockRemote) -> Session {
    let session = Session::new(ConnectionOptions::default());
    session
        .connect(&remote.endpoint())
        .await
        .expect("connect to mock remote");
    assert_eq!(session.state(), SessionState::AwaitingNew);

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.new_session(CapabilitiesRequest::default()).await }
    });
    let command = remote.reply("session.new", new_session_result()).await;
    assert_eq!(command["params"], json!({ "capabilities": {} }));
    task.await.expect("join").expect("session.new");

    session
}

// ============================================================================
// Codec Helpers
// ============================================================================

/// Encodes `value`, checks no `null` was written, decodes it back and
/// asserts equality. Returns the wire form.
pub(crate) fn assert_round_trip<T>(value: &T) -> Value
where
    T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let codec = Codec::new();
    let encoded = codec.encode(value).expect("encode");
    assert!(!has_null(&encoded), "null written for {value:?}: {encoded}");
    let decoded: T = codec.decode(encoded.clone()).expect("decode");
    assert_eq!(&decoded, value, "round trip through {encoded}");
    encoded
}

/// Asserts that decoding `wire` as `T` fails on an unknown discriminant.
pub(crate) fn assert_unknown_variant<T>(wire: Value, expected: &str)
where
    T: DeserializeOwned + std::fmt::Debug,
{
    match Codec::new().decode::<T>(wire) {
        Err(Error::UnknownVariant { discriminant, .. }) => assert_eq!(discriminant, expected),
        other => panic!("expected UnknownVariant `{expected}`, got {other:?}"),
    }
}

fn has_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(has_null),
        Value::Object(map) => map.values().any(has_null),
        _ => false,
    }
}

//! WebDriver BiDi - client-side protocol engine.
//!
//! This library drives a browser over the W3C WebDriver BiDi protocol:
//! JSON messages on one WebSocket, with commands correlated to responses by
//! id and events pushed by the browser at any time.
//!
//! # Architecture
//!
//! The local end (this crate) talks to the remote end (the browser):
//!
//! - **Outbound**: `{id, method, params}` commands
//! - **Inbound**: `success` / `error` responses and `event` messages
//!
//! Layers, bottom up:
//!
//! - [`codec`] encodes commands and classifies inbound frames
//! - [`transport`] owns the socket, correlates responses and dispatches events
//! - [`session`] enforces the lifecycle and tracks subscriptions
//! - [`modules`] exposes one call per wire command, validated locally
//! - [`client`] composes everything into an automation surface
//!
//! # Quick Start
//!
//! ```no_run
//! use webdriver_bidi::{BidiClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = BidiClient::builder()
//!         .endpoint("ws://127.0.0.1:9222/session")
//!         .connect()
//!         .await?;
//!
//!     let tab = client.top_level_context().await?;
//!     client.navigate(&tab, "https://example.com").await?;
//!     let title = client.evaluate(&tab, "document.title").await?;
//!     println!("Page title: {title}");
//!
//!     client.end().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`BidiClient`] facade, builder and options |
//! | [`codec`] | Wire encoding and inbound classification |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`modules`] | Per-module command managers |
//! | [`protocol`] | Wire types by protocol module |
//! | [`session`] | Session lifecycle and subscriptions |
//! | [`transport`] | WebSocket connection and event loop |

// ============================================================================
// Modules
// ============================================================================

/// High-level automation client.
///
/// Use [`BidiClient::builder()`] to create a configured client.
pub mod client;

/// Wire codec: JSON encoding, inbound classification and event decoding.
pub mod codec;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Per-module command managers.
pub mod modules;

/// WebDriver BiDi message types.
///
/// Commands, results and event payloads, one submodule per protocol module.
pub mod protocol;

/// Session lifecycle state machine and subscription registry.
pub mod session;

/// WebSocket transport layer.
///
/// Command correlation, timeouts and event dispatch.
pub mod transport;

#[cfg(test)]
mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{BidiClient, ClientBuilder, ClientOptions, Key};

// Codec
pub use codec::Codec;

// Error types
pub use error::{Error, ErrorCode, Result};

// Identifier types
pub use identifiers::{
    BrowsingContextId, ChannelId, ClientWindowId, CommandId, ExtensionId, Handle, InterceptId,
    NavigationId, PreloadScriptId, RealmId, RequestId, SessionId, SharedId, SubscriptionId,
    UserContextId,
};

// Managers
pub use modules::{
    BrowserManager, BrowsingContextManager, InputManager, LogManager, NetworkManager,
    ScriptManager, StorageManager, WebExtensionManager,
};

// Protocol types
pub use protocol::{BidiCommand, BidiEvent, Command};

// Session & transport
pub use session::{Session, SessionState};
pub use transport::{Connection, ConnectionOptions, EventDispatcher, ListenerId};

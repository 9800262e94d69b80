//! WebSocket transport layer.
//!
//! This module owns the single WebSocket a session talks over: it assigns
//! command ids, correlates responses to waiting callers and hands events to
//! the [`EventDispatcher`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Local end      │                              │  Remote end     │
//! │                 │         WebSocket            │  (browser)      │
//! │  Connection     │─────── commands ────────────►│                 │
//! │  event loop     │◄────── responses, events ────│                 │
//! │  → dispatcher   │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - Open the socket, spawn the event loop
//! 2. `Connection::send` - Register, queue, await the correlated response
//! 3. Events flow to `EventDispatcher::dispatch` on the reader task
//! 4. `Connection::close` or socket death - Fail pending, mark closed
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `dispatcher` | Event listener registry |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Event listener registry.
pub mod dispatcher;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    Connection, ConnectionOptions, DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_PENDING, PendingResponse,
};
pub use dispatcher::{EventDispatcher, Listener, ListenerId};

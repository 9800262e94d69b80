//! WebDriver BiDi protocol types.
//!
//! One submodule per protocol module holds its types, command params,
//! results and event payloads. [`command`], [`event`] and [`message`] tie
//! them to the wire.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | Command | Local → Remote | `{id, method, params}` |
//! | Success | Remote → Local | Result correlated by `id` |
//! | Error | Remote → Local | Failure correlated by `id` (if readable) |
//! | Event | Remote → Local | Subscription notification, no `id` |
//!
//! # Command Naming
//!
//! Commands and events follow `module.methodName` format:
//!
//! - `browsingContext.navigate`
//! - `network.addIntercept`
//! - `log.entryAdded`

// ============================================================================
// Submodules
// ============================================================================

/// `browser` module types.
pub mod browser;

/// `browsingContext` module types.
pub mod browsing_context;

/// Command enum and typed command trait.
pub mod command;

/// Typed events and the decoder table.
pub mod event;

/// `input` module types.
pub mod input;

/// `log` module types.
pub mod log;

/// Frame envelopes.
pub mod message;

/// `network` module types.
pub mod network;

/// `script` module types.
pub mod script;

/// `session` module types.
pub mod session;

/// `storage` module types.
pub mod storage;

/// `webExtension` module types.
pub mod web_extension;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BidiCommand, BrowserCommand, BrowsingContextCommand, Command, EmptyResult, InputCommand,
    NetworkCommand, ScriptCommand, SessionCommand, StorageCommand, WebExtensionCommand,
};
pub use event::BidiEvent;
pub use message::{ErrorResponse, EventMessage, Message, SuccessResponse};

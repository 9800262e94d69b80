//! Frame envelopes: outbound command frames and inbound messages.
//!
//! # Format
//!
//! Outbound:
//!
//! ```json
//! { "id": 1, "method": "module.methodName", "params": { ... } }
//! ```
//!
//! Inbound, discriminated by `type`:
//!
//! ```json
//! { "type": "success", "id": 1, "result": { ... } }
//! { "type": "error", "id": 1, "error": "no such frame", "message": "...", "stacktrace": "..." }
//! { "type": "event", "method": "module.eventName", "params": { ... } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::WireEnum;
use crate::error::{Error, ErrorCode};
use crate::identifiers::CommandId;

use super::Command;

// ============================================================================
// CommandFrame
// ============================================================================

/// Outbound frame: a command plus its correlation id.
#[derive(Debug, Serialize)]
pub struct CommandFrame<'a> {
    /// Correlation id.
    pub id: CommandId,

    /// Command with `method` and `params`.
    #[serde(flatten)]
    pub command: &'a Command,
}

// ============================================================================
// Message
// ============================================================================

/// Inbound frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Successful command result.
    Success(SuccessResponse),
    /// Failed command, or a protocol-level failure with no id.
    Error(ErrorResponse),
    /// Unsolicited event.
    Event(EventMessage),
}

impl Message {
    /// Returns the correlation id, if the frame has one.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        match self {
            Self::Success(success) => Some(success.id),
            Self::Error(error) => error.id,
            Self::Event(_) => None,
        }
    }
}

/// `{"type":"success"}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Id of the answered command.
    pub id: CommandId,

    /// Method-specific result.
    pub result: Value,
}

/// `{"type":"error"}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Id of the failed command; absent when the remote end could not read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,

    /// Error code, kept raw so an unknown code still reaches the caller.
    pub error: String,

    /// Human-readable message.
    pub message: String,

    /// Remote stack trace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
}

impl ErrorResponse {
    /// Converts to [`Error::Protocol`].
    ///
    /// A code outside the closed set becomes [`Error::UnknownEnumValue`].
    #[must_use]
    pub fn into_error(self) -> Error {
        match ErrorCode::parse_wire(&self.error) {
            Ok(code) => Error::protocol(code, self.message, self.stacktrace),
            Err(err) => err,
        }
    }
}

/// `{"type":"event"}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Event method (`module.eventName`).
    pub method: String,

    /// Raw event payload.
    #[serde(default)]
    pub params: Value,
}

// ============================================================================
// Tests
// ============================================================================

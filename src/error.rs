//! Error types for the WebDriver BiDi client.
//!
//! This module defines all error types used throughout the crate, plus the
//! closed set of remote error codes a BiDi error response may carry.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_bidi::{Error, Result};
//!
//! async fn example(client: &BidiClient) -> Result<()> {
//!     match client.navigate(&context, "https://example.com").await {
//!         Err(Error::Protocol { code, .. }) => println!("remote said {code}"),
//!         other => other.map(|_| ())?,
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::TransportClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Decode`], [`Error::UnknownEnumValue`], [`Error::UnknownVariant`], [`Error::ScriptException`] |
//! | Session | [`Error::SessionEnded`], [`Error::InvalidState`] |
//! | Local | [`Error::InvalidArgument`], [`Error::RequestTimeout`], [`Error::TooManyPending`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::codec::wire_enum;
use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorCode
// ============================================================================

wire_enum! {
    /// Error code carried by a remote `{"type":"error"}` response.
    ///
    /// The set is closed; a code outside it fails decoding with
    /// [`Error::UnknownEnumValue`].
    pub enum ErrorCode {
        /// Malformed or semantically invalid command parameters.
        InvalidArgument => "invalid argument",
        /// Locator could not be parsed.
        InvalidSelector => "invalid selector",
        /// Session id unknown to the remote end.
        InvalidSessionId => "invalid session id",
        /// Extension could not be installed.
        InvalidWebExtension => "invalid web extension",
        /// Pointer action moved outside the viewport.
        MoveTargetOutOfBounds => "move target out of bounds",
        /// No user prompt is open.
        NoSuchAlert => "no such alert",
        /// Referenced element does not exist.
        NoSuchElement => "no such element",
        /// Referenced browsing context does not exist.
        NoSuchFrame => "no such frame",
        /// Referenced script handle does not exist.
        NoSuchHandle => "no such handle",
        /// History traversal target does not exist.
        NoSuchHistoryEntry => "no such history entry",
        /// Referenced network intercept does not exist.
        NoSuchIntercept => "no such intercept",
        /// Referenced node does not exist.
        NoSuchNode => "no such node",
        /// Referenced network request is not blocked.
        NoSuchRequest => "no such request",
        /// Referenced preload script does not exist.
        NoSuchScript => "no such script",
        /// Referenced storage partition does not exist.
        NoSuchStoragePartition => "no such storage partition",
        /// Referenced user context does not exist.
        NoSuchUserContext => "no such user context",
        /// Referenced extension does not exist.
        NoSuchWebExtension => "no such web extension",
        /// `session.new` was refused.
        SessionNotCreated => "session not created",
        /// Screenshot failed.
        UnableToCaptureScreen => "unable to capture screen",
        /// Browser refused to close.
        UnableToCloseBrowser => "unable to close browser",
        /// Cookie was rejected.
        UnableToSetCookie => "unable to set cookie",
        /// File input could not be populated.
        UnableToSetFileInput => "unable to set file input",
        /// Storage partition could not be inferred.
        UnderspecifiedStoragePartition => "underspecified storage partition",
        /// Method is not known to the remote end.
        UnknownCommand => "unknown command",
        /// Catch-all remote failure.
        UnknownError => "unknown error",
        /// Operation not supported by the remote end.
        UnsupportedOperation => "unsupported operation",
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection could not be opened.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Opening the WebSocket took longer than the configured timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The socket closed while the command was outstanding, or was already
    /// closed when the command was sent. The transport never reconnects.
    #[error("Transport closed")]
    TransportClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Remote error response correlated to a command.
    #[error("Protocol error ({code}): {message}")]
    Protocol {
        /// Remote error code.
        code: ErrorCode,
        /// Human-readable message from the remote end.
        message: String,
        /// Remote stack trace, when provided.
        stacktrace: Option<String>,
    },

    /// Inbound JSON did not match the expected shape.
    #[error("Failed to decode {type_name}: {message}")]
    Decode {
        /// Type being decoded.
        type_name: String,
        /// Decoder message.
        message: String,
    },

    /// String outside the closed set of an enum wrapper.
    #[error("Unknown value `{value}` for {type_name}")]
    UnknownEnumValue {
        /// Enum wrapper type.
        type_name: String,
        /// Offending wire string.
        value: String,
    },

    /// Discriminant outside the closed variant table of a tagged union.
    #[error("Unknown variant `{discriminant}` for {type_name}")]
    UnknownVariant {
        /// Tagged union type.
        type_name: String,
        /// Offending discriminant.
        discriminant: String,
    },

    /// Script ran and threw.
    #[error("Script exception at {line_number}:{column_number}: {message}")]
    ScriptException {
        /// Exception text.
        message: String,
        /// Zero-based line.
        line_number: u64,
        /// Zero-based column.
        column_number: u64,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Command attempted after the session started ending.
    #[error("Session ended")]
    SessionEnded,

    /// Operation not valid in the current session state.
    #[error("Invalid session state: expected {expected}, found {actual}")]
    InvalidState {
        /// State required by the operation.
        expected: String,
        /// Current state.
        actual: String,
    },

    // ========================================================================
    // Local Errors
    // ========================================================================
    /// Local validation failed; nothing was sent.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Caller stopped waiting for a command. The command stays on the wire.
    #[error("Command {command_id} ({method}) timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Id of the abandoned command.
        command_id: CommandId,
        /// Method of the abandoned command.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Pending table is full.
    #[error("Too many pending commands: {pending}/{limit}")]
    TooManyPending {
        /// Commands currently outstanding.
        pending: usize,
        /// Configured limit.
        limit: usize,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a remote protocol error.
    #[inline]
    pub fn protocol(
        code: ErrorCode,
        message: impl Into<String>,
        stacktrace: Option<String>,
    ) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
            stacktrace,
        }
    }

    /// Creates a decode error.
    #[inline]
    pub fn decode(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown enum value error.
    #[inline]
    pub fn unknown_enum_value(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown variant error.
    #[inline]
    pub fn unknown_variant(type_name: impl Into<String>, discriminant: impl Into<String>) -> Self {
        Self::UnknownVariant {
            type_name: type_name.into(),
            discriminant: discriminant.into(),
        }
    }

    /// Creates a script exception error.
    #[inline]
    pub fn script_exception(message: impl Into<String>, line_number: u64, column_number: u64) -> Self {
        Self::ScriptException {
            message: message.into(),
            line_number,
            column_number,
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(command_id: CommandId, method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            command_id,
            method: method.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the remote error code, if this is a remote error response.
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Protocol { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::TransportClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a local schema mismatch on decode.
    #[inline]
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::UnknownEnumValue { .. } | Self::UnknownVariant { .. }
        )
    }

    /// Returns `true` if retrying on the same connection may succeed.
    ///
    /// Whether a retry is *safe* is still up to the caller.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeout { .. } | Self::TooManyPending { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    use crate::codec::WireEnum;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_script_exception_display() {
        let err = Error::script_exception("TypeError: x is null", 3, 14);
        assert_eq!(err.to_string(), "Script exception at 3:14: TypeError: x is null");
        assert!(err.code().is_none());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_protocol_error_display() {
        let err = Error::protocol(ErrorCode::NoSuchIntercept, "gone", None);
        assert_eq!(err.to_string(), "Protocol error (no such intercept): gone");
        assert_eq!(err.code(), Some(ErrorCode::NoSuchIntercept));
    }

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(ErrorCode::InvalidArgument.as_wire(), "invalid argument");
        assert_eq!(
            ErrorCode::from_wire("session not created"),
            Some(ErrorCode::SessionNotCreated)
        );
        assert_eq!(ErrorCode::from_wire("Invalid Argument"), None);
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::connection_timeout(5000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::TransportClosed.is_connection_error());
        assert!(!Error::SessionEnded.is_connection_error());
    }

    #[test]
    fn test_is_decode_error() {
        assert!(Error::unknown_variant("PartitionDescriptor", "bogus").is_decode_error());
        assert!(Error::unknown_enum_value("ReadinessState", "soon").is_decode_error());
        assert!(!Error::invalid_argument("x").is_decode_error());
    }

    #[test]
    fn test_is_recoverable() {
        let err = Error::request_timeout(CommandId::new(3), "browsingContext.navigate", 1000);
        assert!(err.is_recoverable());
        assert!(!Error::TransportClosed.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}

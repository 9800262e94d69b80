//! `log` module: console and JavaScript error entries.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::codec::wire_enum;

use super::script::{RemoteValue, Source, StackTrace};

// ============================================================================
// Types
// ============================================================================

wire_enum! {
    /// Log severity.
    pub enum Level {
        /// Debug.
        Debug => "debug",
        /// Info.
        Info => "info",
        /// Warning.
        Warn => "warn",
        /// Error.
        Error => "error",
    }
}

/// Fields common to every log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLogEntry {
    /// Severity.
    pub level: Level,
    /// Where it was logged.
    pub source: Source,
    /// Text; `None` when the remote end sent `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Stack at the log call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
}

/// `log.entryAdded` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    /// `console.*` call.
    Console {
        /// Common fields.
        #[serde(flatten)]
        base: BaseLogEntry,
        /// Console method (`log`, `warn`, ...).
        method: String,
        /// Arguments.
        args: Vec<RemoteValue>,
    },
    /// Uncaught JavaScript error.
    Javascript {
        /// Common fields.
        #[serde(flatten)]
        base: BaseLogEntry,
    },
}

impl Entry {
    /// Returns the common fields.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &BaseLogEntry {
        match self {
            Self::Console { base, .. } | Self::Javascript { base } => base,
        }
    }

    /// Returns the severity.
    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.base().level
    }

    /// Returns the text, if any.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.base().text.as_deref()
    }
}

// ============================================================================
// Tests
// ============================================================================

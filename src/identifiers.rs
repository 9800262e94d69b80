//! Type-safe identifier wrappers.
//!
//! Every protocol identifier is a bare JSON string on the wire. The newtypes
//! here keep a browsing context id from being passed where an intercept id is
//! expected, while encoding exactly as the string they wrap.
//!
//! | Type | Wire type |
//! |------|-----------|
//! | [`BrowsingContextId`] | `browsingContext.BrowsingContext` |
//! | [`UserContextId`] | `browser.UserContext` |
//! | [`ClientWindowId`] | `browser.ClientWindow` |
//! | [`NavigationId`] | `browsingContext.Navigation` |
//! | [`RequestId`] | `network.Request` |
//! | [`InterceptId`] | `network.Intercept` |
//! | [`ExtensionId`] | `webExtension.Extension` |
//! | [`RealmId`] | `script.Realm` |
//! | [`PreloadScriptId`] | `script.PreloadScript` |
//! | [`SharedId`] | `script.SharedId` |
//! | [`Handle`] | `script.Handle` |
//! | [`ChannelId`] | `script.Channel` |
//! | [`SubscriptionId`] | `session.Subscription` |
//! | [`SessionId`] | `sessionId` in `session.new` |
//!
//! [`CommandId`] is the numeric correlation id of an outbound command.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Macros
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw id string.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the id as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the raw string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ============================================================================
// String Identifiers
// ============================================================================

string_id! {
    /// Navigable (tab or frame) identifier.
    BrowsingContextId
}

string_id! {
    /// User context (profile-like container) identifier.
    UserContextId
}

string_id! {
    /// OS-level browser window identifier.
    ClientWindowId
}

string_id! {
    /// Identifier of one navigation.
    NavigationId
}

string_id! {
    /// Network request identifier.
    RequestId
}

string_id! {
    /// Network intercept identifier.
    InterceptId
}

string_id! {
    /// Installed web extension identifier.
    ExtensionId
}

string_id! {
    /// Script realm identifier.
    RealmId
}

string_id! {
    /// Preload script identifier.
    PreloadScriptId
}

string_id! {
    /// Stable node reference shared across realms.
    SharedId
}

string_id! {
    /// Handle to a remote object kept alive by the remote end.
    Handle
}

string_id! {
    /// Script message channel identifier.
    ChannelId
}

string_id! {
    /// Event subscription identifier issued by `session.subscribe`.
    SubscriptionId
}

string_id! {
    /// BiDi session identifier.
    SessionId
}

// ============================================================================
// CommandId
// ============================================================================

/// Correlation id of an outbound command.
///
/// Allocated by the transport at send time, strictly increasing, never
/// reused on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw command id.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the id that follows this one.
    #[inline]
    #[must_use]
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

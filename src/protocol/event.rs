//! Typed event payloads.
//!
//! Events are notifications the remote end pushes for active subscriptions.
//! They carry no id and are never correlated to a command.
//!
//! # Event Types
//!
//! | Module | Events |
//! |--------|--------|
//! | `browsingContext` | context lifecycle, navigation, downloads, user prompts |
//! | `network` | `beforeRequestSent`, `responseStarted`, `responseCompleted`, `fetchError`, `authRequired` |
//! | `script` | `message`, `realmCreated`, `realmDestroyed` |
//! | `log` | `entryAdded` |
//!
//! Methods outside this table decode to [`BidiEvent::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::codec::Codec;
use crate::error::Result;
use crate::identifiers::BrowsingContextId;

use super::{browsing_context, log, network, script};

// ============================================================================
// Decoder Table
// ============================================================================

/// Decodes an event payload for one method.
pub type EventDecoder = fn(&Codec, Value) -> Result<BidiEvent>;

/// Declares [`BidiEvent`], its `method()` lookup and the decoder table.
macro_rules! event_table {
    (
        $(
            $(#[$vmeta:meta])*
            $variant:ident($payload:ty) = $method:literal
        ),+ $(,)?
    ) => {
        /// A decoded event.
        #[derive(Debug, Clone, PartialEq)]
        pub enum BidiEvent {
            $(
                $(#[$vmeta])*
                $variant($payload),
            )+
            /// Event without a registered decoder.
            Unknown {
                /// Event method.
                method: String,
                /// Raw payload.
                params: Value,
            },
        }

        impl BidiEvent {
            /// Returns the event method (`module.eventName`).
            #[must_use]
            pub fn method(&self) -> &str {
                match self {
                    $(Self::$variant(_) => $method,)+
                    Self::Unknown { method, .. } => method,
                }
            }
        }

        /// Static `method -> decoder` table, loaded into each [`Codec`].
        pub(crate) static EVENT_DECODERS: &[(&str, EventDecoder)] = &[
            $(
                (
                    $method,
                    (|codec: &Codec, params: Value| {
                        codec.decode::<$payload>(params).map(BidiEvent::$variant)
                    }) as EventDecoder,
                ),
            )+
        ];
    };
}

event_table! {
    /// A browsing context was created.
    ContextCreated(browsing_context::Info) = "browsingContext.contextCreated",
    /// A browsing context was destroyed.
    ContextDestroyed(browsing_context::Info) = "browsingContext.contextDestroyed",
    /// Navigation started.
    NavigationStarted(browsing_context::NavigationInfo) = "browsingContext.navigationStarted",
    /// Same-document fragment navigation.
    FragmentNavigated(browsing_context::NavigationInfo) = "browsingContext.fragmentNavigated",
    /// History API changed the URL.
    HistoryUpdated(browsing_context::HistoryUpdated) = "browsingContext.historyUpdated",
    /// `DOMContentLoaded` fired.
    DomContentLoaded(browsing_context::NavigationInfo) = "browsingContext.domContentLoaded",
    /// `load` fired.
    Load(browsing_context::NavigationInfo) = "browsingContext.load",
    /// A download is starting.
    DownloadWillBegin(browsing_context::DownloadWillBegin) = "browsingContext.downloadWillBegin",
    /// Navigation was aborted.
    NavigationAborted(browsing_context::NavigationInfo) = "browsingContext.navigationAborted",
    /// Navigation committed.
    NavigationCommitted(browsing_context::NavigationInfo) = "browsingContext.navigationCommitted",
    /// Navigation failed.
    NavigationFailed(browsing_context::NavigationInfo) = "browsingContext.navigationFailed",
    /// A user prompt opened.
    UserPromptOpened(browsing_context::UserPromptOpened) = "browsingContext.userPromptOpened",
    /// A user prompt closed.
    UserPromptClosed(browsing_context::UserPromptClosed) = "browsingContext.userPromptClosed",
    /// Server requested authentication.
    AuthRequired(network::AuthRequired) = "network.authRequired",
    /// A request is about to be sent.
    BeforeRequestSent(network::BeforeRequestSent) = "network.beforeRequestSent",
    /// A request failed.
    FetchError(network::FetchError) = "network.fetchError",
    /// Response body finished.
    ResponseCompleted(network::ResponseEvent) = "network.responseCompleted",
    /// Response headers arrived.
    ResponseStarted(network::ResponseEvent) = "network.responseStarted",
    /// A channel posted a message.
    ScriptMessage(script::Message) = "script.message",
    /// A realm was created.
    RealmCreated(script::RealmInfo) = "script.realmCreated",
    /// A realm was destroyed.
    RealmDestroyed(script::RealmDestroyed) = "script.realmDestroyed",
    /// A log entry was added.
    LogEntryAdded(log::Entry) = "log.entryAdded",
}

impl BidiEvent {
    /// Returns the module name from the method.
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        let method = self.method();
        method.split_once('.').map_or(method, |(module, _)| module)
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method().split_once('.').map_or("", |(_, name)| name)
    }

    /// Returns the browsing context the event is about, when it has one.
    #[must_use]
    pub fn context(&self) -> Option<&BrowsingContextId> {
        match self {
            Self::ContextCreated(info) | Self::ContextDestroyed(info) => Some(&info.context),
            Self::NavigationStarted(nav)
            | Self::FragmentNavigated(nav)
            | Self::DomContentLoaded(nav)
            | Self::Load(nav)
            | Self::NavigationAborted(nav)
            | Self::NavigationCommitted(nav)
            | Self::NavigationFailed(nav) => Some(&nav.context),
            Self::DownloadWillBegin(download) => Some(&download.navigation.context),
            Self::HistoryUpdated(update) => Some(&update.context),
            Self::UserPromptOpened(prompt) => Some(&prompt.context),
            Self::UserPromptClosed(prompt) => Some(&prompt.context),
            Self::AuthRequired(e) => e.base.context.as_ref(),
            Self::BeforeRequestSent(e) => e.base.context.as_ref(),
            Self::FetchError(e) => e.base.context.as_ref(),
            Self::ResponseCompleted(e) | Self::ResponseStarted(e) => e.base.context.as_ref(),
            Self::ScriptMessage(message) => message.source.context.as_ref(),
            Self::RealmCreated(realm) => realm.context.as_ref(),
            Self::LogEntryAdded(entry) => entry.base().source.context.as_ref(),
            Self::RealmDestroyed(_) | Self::Unknown { .. } => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

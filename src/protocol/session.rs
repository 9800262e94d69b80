//! `session` module: capabilities, lifecycle, subscriptions.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::wire_enum;
use crate::identifiers::{BrowsingContextId, SessionId, SubscriptionId, UserContextId};

// ============================================================================
// User Prompts
// ============================================================================

wire_enum! {
    /// What the remote end does with a user prompt.
    pub enum UserPromptHandlerType {
        /// Accept it.
        Accept => "accept",
        /// Dismiss it.
        Dismiss => "dismiss",
        /// Leave it open.
        Ignore => "ignore",
    }
}

/// Per-prompt-kind handler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptHandler {
    /// `alert()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<UserPromptHandlerType>,
    /// `beforeunload`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_unload: Option<UserPromptHandlerType>,
    /// `confirm()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<UserPromptHandlerType>,
    /// Fallback for unlisted kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<UserPromptHandlerType>,
    /// File picker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<UserPromptHandlerType>,
    /// `prompt()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<UserPromptHandlerType>,
}

// ============================================================================
// Proxy
// ============================================================================

/// Proxy configuration, tagged by `proxyType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "proxyType", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ProxyConfiguration {
    /// WPAD discovery.
    Autodetect,
    /// No proxy.
    Direct,
    /// Explicit proxies.
    Manual {
        /// `host:port` for HTTP.
        #[serde(skip_serializing_if = "Option::is_none")]
        http_proxy: Option<String>,
        /// `host:port` for HTTPS.
        #[serde(skip_serializing_if = "Option::is_none")]
        ssl_proxy: Option<String>,
        /// `host:port` for SOCKS.
        #[serde(skip_serializing_if = "Option::is_none")]
        socks_proxy: Option<String>,
        /// SOCKS version, 0 to 255.
        #[serde(skip_serializing_if = "Option::is_none")]
        socks_version: Option<u8>,
        /// Hosts that bypass the proxy.
        #[serde(skip_serializing_if = "Option::is_none")]
        no_proxy: Option<Vec<String>>,
    },
    /// PAC file.
    Pac {
        /// PAC URL.
        proxy_autoconfig_url: String,
    },
    /// Operating system settings.
    System,
}

// ============================================================================
// Capabilities
// ============================================================================

/// One set of requested capabilities.
///
/// Vendor extension capabilities (`moz:...`, `goog:...`) go in
/// `extensions` and are spliced onto the object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRequest {
    /// Accept invalid TLS certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_insecure_certs: Option<bool>,
    /// Browser name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
    /// Browser version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_version: Option<String>,
    /// Platform name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    /// Proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfiguration>,
    /// User prompt handling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_prompt_behavior: Option<UserPromptHandler>,
    /// Request a BiDi upgrade (classic sessions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_socket_url: Option<bool>,
    /// Vendor extension capabilities.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// `alwaysMatch` / `firstMatch` capability negotiation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
    /// Required of every match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_match: Option<CapabilityRequest>,
    /// Alternatives, tried in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_match: Option<Vec<CapabilityRequest>>,
}

/// Capabilities the remote end granted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionCapabilities {
    /// Invalid TLS certificates are accepted.
    pub accept_insecure_certs: bool,
    /// Browser name.
    pub browser_name: String,
    /// Browser version.
    pub browser_version: String,
    /// Platform name.
    pub platform_name: String,
    /// Window rect commands are supported.
    pub set_window_rect: bool,
    /// Default user agent.
    pub user_agent: String,
    /// Effective proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfiguration>,
    /// Effective prompt handling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_prompt_behavior: Option<UserPromptHandler>,
    /// BiDi endpoint, when upgraded from a classic session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_socket_url: Option<String>,
    /// Vendor extension capabilities.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

// ============================================================================
// Commands
// ============================================================================

/// `session.status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {}

/// Result of `session.status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    /// Remote end can create a new session.
    pub ready: bool,
    /// Implementation-defined detail.
    pub message: String,
}

/// `session.new`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct New {
    /// Requested capabilities.
    pub capabilities: CapabilitiesRequest,
}

/// Result of `session.new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    /// New session id.
    pub session_id: SessionId,
    /// Granted capabilities.
    #[serde(default)]
    pub capabilities: SessionCapabilities,
}

/// `session.end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct End {}

/// `session.subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    /// Event methods or module names.
    pub events: Vec<String>,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
    /// Restrict to these user contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
}

/// Result of `session.subscribe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeResult {
    /// Subscription id; older remote ends omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionId>,
}

/// `session.unsubscribe`, in one of two mutually exclusive forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Unsubscribe {
    /// Remove subscriptions by id.
    ById {
        /// Ids returned by `session.subscribe`.
        subscriptions: Vec<SubscriptionId>,
    },
    /// Remove a subscription by its event and context list.
    ByAttributes {
        /// Event methods or module names.
        events: Vec<String>,
        /// Contexts the subscription was made for.
        #[serde(skip_serializing_if = "Option::is_none")]
        contexts: Option<Vec<BrowsingContextId>>,
    },
}

// ============================================================================
// Tests
// ============================================================================

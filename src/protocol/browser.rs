//! `browser` module: user contexts and client windows.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::codec::wire_enum;
use crate::identifiers::{ClientWindowId, UserContextId};

use super::session::{ProxyConfiguration, UserPromptHandler};

// ============================================================================
// Types
// ============================================================================

wire_enum! {
    /// Reported state of an OS window.
    pub enum WindowState {
        /// Fullscreen.
        Fullscreen => "fullscreen",
        /// Maximized.
        Maximized => "maximized",
        /// Minimized.
        Minimized => "minimized",
        /// Normal.
        Normal => "normal",
    }
}

/// An OS window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientWindowInfo {
    /// Window id.
    pub client_window: ClientWindowId,
    /// Window has focus.
    pub active: bool,
    /// State.
    pub state: WindowState,
    /// Left edge in screen pixels.
    pub x: i64,
    /// Top edge in screen pixels.
    pub y: i64,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// A user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContextInfo {
    /// User context id; `"default"` for the default one.
    pub user_context: UserContextId,
}

/// Requested window state, spliced onto `browser.setClientWindowState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ClientWindowState {
    /// Fullscreen.
    Fullscreen,
    /// Maximized.
    Maximized,
    /// Minimized.
    Minimized,
    /// Normal, optionally resized or moved.
    Normal {
        /// New width.
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        /// New height.
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        /// New left edge.
        #[serde(skip_serializing_if = "Option::is_none")]
        x: Option<i64>,
        /// New top edge.
        #[serde(skip_serializing_if = "Option::is_none")]
        y: Option<i64>,
    },
}

// ============================================================================
// Commands
// ============================================================================

/// `browser.close`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {}

/// `browser.createUserContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserContext {
    /// Accept invalid TLS certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_insecure_certs: Option<bool>,
    /// Proxy for this user context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfiguration>,
    /// Prompt handling for this user context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_prompt_behavior: Option<UserPromptHandler>,
}

/// `browser.getClientWindows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetClientWindows {}

/// Result of `browser.getClientWindows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClientWindowsResult {
    /// Open windows.
    pub client_windows: Vec<ClientWindowInfo>,
}

/// `browser.getUserContexts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserContexts {}

/// Result of `browser.getUserContexts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserContextsResult {
    /// Existing user contexts.
    pub user_contexts: Vec<UserContextInfo>,
}

/// `browser.removeUserContext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserContext {
    /// User context to remove; never `"default"`.
    pub user_context: UserContextId,
}

/// `browser.setClientWindowState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetClientWindowState {
    /// Window to change.
    pub client_window: ClientWindowId,
    /// Target state.
    #[serde(flatten)]
    pub state: ClientWindowState,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::testing::{assert_round_trip, assert_unknown_variant};

    #[test]
    fn test_set_client_window_state_splices_state() {
        let params = SetClientWindowState {
            client_window: ClientWindowId::new("w-1"),
            state: ClientWindowState::Normal {
                width: Some(800),
                height: Some(600),
                x: None,
                y: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&params).expect("encode"),
            json!({ "clientWindow": "w-1", "state": "normal", "width": 800, "height": 600 })
        );

        let maximized = SetClientWindowState {
            client_window: ClientWindowId::new("w-1"),
            state: ClientWindowState::Maximized,
        };
        assert_eq!(
            serde_json::to_value(&maximized).expect("encode"),
            json!({ "clientWindow": "w-1", "state": "maximized" })
        );
    }

    #[test]
    fn test_client_window_info_decode() {
        let info: ClientWindowInfo = serde_json::from_value(json!({
            "clientWindow": "w-1",
            "active": true,
            "state": "normal",
            "x": 0, "y": 0, "width": 1280, "height": 720
        }))
        .expect("decode");
        assert_eq!(info.state, WindowState::Normal);
    }

    #[test]
    fn test_spliced_window_state_round_trips() {
        for state in [
            ClientWindowState::Fullscreen,
            ClientWindowState::Maximized,
            ClientWindowState::Minimized,
            ClientWindowState::Normal {
                width: None,
                height: None,
                x: None,
                y: None,
            },
            ClientWindowState::Normal {
                width: Some(1024),
                height: Some(768),
                x: Some(-8),
                y: Some(0),
            },
        ] {
            let params = SetClientWindowState {
                client_window: ClientWindowId::new("w-1"),
                state,
            };
            let encoded = assert_round_trip(&params);
            assert!(encoded.get("state").is_some_and(|s| s.is_string()));
        }
    }

    #[test]
    fn test_unknown_window_state_is_rejected() {
        assert_unknown_variant::<ClientWindowState>(json!({ "state": "docked" }), "docked");
    }
}

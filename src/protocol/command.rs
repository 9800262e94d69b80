//! Command definitions organized by module.
//!
//! Every command is a params struct from one of the module files. The
//! `command_group!` table below ties each struct to its wire method and to
//! the result type the remote end answers with, so [`BidiCommand::Output`]
//! is known statically at every send site.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `session` | Status, lifecycle, subscriptions |
//! | `browser` | User contexts, client windows |
//! | `browsingContext` | Tree, navigation, screenshots, prompts |
//! | `input` | Action sequences, file inputs |
//! | `network` | Intercepts, request/response control |
//! | `script` | Evaluation, realms, preload scripts |
//! | `storage` | Cookies |
//! | `webExtension` | Install, uninstall |

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{browser, browsing_context, input, network, script, session, storage, web_extension};

// ============================================================================
// BidiCommand
// ============================================================================

/// A typed command: params convertible into [`Command`], with a known result.
pub trait BidiCommand: Into<Command> {
    /// Result shape of a successful response.
    type Output: DeserializeOwned;

    /// Wire method name.
    const METHOD: &'static str;
}

/// Result of commands that answer with `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResult {}

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
///
/// This enum wraps module-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Session module commands.
    Session(SessionCommand),
    /// Browser module commands.
    Browser(BrowserCommand),
    /// BrowsingContext module commands.
    BrowsingContext(BrowsingContextCommand),
    /// Input module commands.
    Input(InputCommand),
    /// Network module commands.
    Network(NetworkCommand),
    /// Script module commands.
    Script(ScriptCommand),
    /// Storage module commands.
    Storage(StorageCommand),
    /// WebExtension module commands.
    WebExtension(WebExtensionCommand),
}

impl Command {
    /// Returns the wire method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Session(c) => c.method(),
            Self::Browser(c) => c.method(),
            Self::BrowsingContext(c) => c.method(),
            Self::Input(c) => c.method(),
            Self::Network(c) => c.method(),
            Self::Script(c) => c.method(),
            Self::Storage(c) => c.method(),
            Self::WebExtension(c) => c.method(),
        }
    }
}

// ============================================================================
// Command Table
// ============================================================================

/// Declares one module's command enum plus the `From`/[`BidiCommand`]
/// impls of every params struct in it.
macro_rules! command_group {
    (
        $(#[$meta:meta])*
        $name:ident => $outer:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($params:ty) = $method:literal -> $output:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize)]
        #[serde(tag = "method", content = "params")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $method)]
                $variant($params),
            )+
        }

        impl $name {
            /// Every wire method of this module, in declaration order.
            pub const METHODS: &'static [&'static str] = &[$($method),+];

            /// Returns the wire method name.
            #[must_use]
            pub fn method(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $method,)+
                }
            }
        }

        $(
            impl From<$params> for Command {
                #[inline]
                fn from(params: $params) -> Self {
                    Command::$outer($name::$variant(params))
                }
            }

            impl BidiCommand for $params {
                type Output = $output;
                const METHOD: &'static str = $method;
            }
        )+
    };
}

command_group! {
    /// Session module commands.
    SessionCommand => Session {
        /// Remote end readiness.
        Status(session::Status) = "session.status" -> session::StatusResult,
        /// Create a session.
        New(session::New) = "session.new" -> session::NewResult,
        /// End the session.
        End(session::End) = "session.end" -> EmptyResult,
        /// Subscribe to events.
        Subscribe(session::Subscribe) = "session.subscribe" -> session::SubscribeResult,
        /// Unsubscribe from events.
        Unsubscribe(session::Unsubscribe) = "session.unsubscribe" -> EmptyResult,
    }
}

command_group! {
    /// Browser module commands.
    BrowserCommand => Browser {
        /// Close every window and end the session.
        Close(browser::Close) = "browser.close" -> EmptyResult,
        /// Create a user context.
        CreateUserContext(browser::CreateUserContext) = "browser.createUserContext"
            -> browser::UserContextInfo,
        /// List OS windows.
        GetClientWindows(browser::GetClientWindows) = "browser.getClientWindows"
            -> browser::GetClientWindowsResult,
        /// List user contexts.
        GetUserContexts(browser::GetUserContexts) = "browser.getUserContexts"
            -> browser::GetUserContextsResult,
        /// Remove a user context.
        RemoveUserContext(browser::RemoveUserContext) = "browser.removeUserContext" -> EmptyResult,
        /// Change an OS window's state.
        SetClientWindowState(browser::SetClientWindowState) = "browser.setClientWindowState"
            -> browser::ClientWindowInfo,
    }
}

command_group! {
    /// BrowsingContext module commands for navigation and tab management.
    BrowsingContextCommand => BrowsingContext {
        /// Focus a top-level context.
        Activate(browsing_context::Activate) = "browsingContext.activate" -> EmptyResult,
        /// Take a screenshot.
        CaptureScreenshot(browsing_context::CaptureScreenshot) = "browsingContext.captureScreenshot"
            -> browsing_context::CaptureScreenshotResult,
        /// Close a top-level context.
        Close(browsing_context::Close) = "browsingContext.close" -> EmptyResult,
        /// Open a tab or window.
        Create(browsing_context::Create) = "browsingContext.create"
            -> browsing_context::CreateResult,
        /// Read the context tree.
        GetTree(browsing_context::GetTree) = "browsingContext.getTree"
            -> browsing_context::GetTreeResult,
        /// Accept or dismiss a prompt.
        HandleUserPrompt(browsing_context::HandleUserPrompt) = "browsingContext.handleUserPrompt"
            -> EmptyResult,
        /// Find nodes.
        LocateNodes(browsing_context::LocateNodes) = "browsingContext.locateNodes"
            -> browsing_context::LocateNodesResult,
        /// Navigate to a URL.
        Navigate(browsing_context::Navigate) = "browsingContext.navigate"
            -> browsing_context::NavigateResult,
        /// Print to PDF.
        Print(browsing_context::Print) = "browsingContext.print" -> browsing_context::PrintResult,
        /// Reload.
        Reload(browsing_context::Reload) = "browsingContext.reload"
            -> browsing_context::NavigateResult,
        /// Resize the viewport.
        SetViewport(browsing_context::SetViewport) = "browsingContext.setViewport" -> EmptyResult,
        /// Go back or forward.
        TraverseHistory(browsing_context::TraverseHistory) = "browsingContext.traverseHistory"
            -> EmptyResult,
    }
}

command_group! {
    /// Input module commands for keyboard, pointer and wheel.
    InputCommand => Input {
        /// Run action sequences.
        PerformActions(input::PerformActions) = "input.performActions" -> EmptyResult,
        /// Release pressed keys and buttons.
        ReleaseActions(input::ReleaseActions) = "input.releaseActions" -> EmptyResult,
        /// Populate a file input.
        SetFiles(input::SetFiles) = "input.setFiles" -> EmptyResult,
    }
}

command_group! {
    /// Network module commands for interception.
    NetworkCommand => Network {
        /// Block requests at given phases.
        AddIntercept(network::AddIntercept) = "network.addIntercept"
            -> network::AddInterceptResult,
        /// Resume a blocked request.
        ContinueRequest(network::ContinueRequest) = "network.continueRequest" -> EmptyResult,
        /// Resume a blocked response.
        ContinueResponse(network::ContinueResponse) = "network.continueResponse" -> EmptyResult,
        /// Answer an auth challenge.
        ContinueWithAuth(network::ContinueWithAuth) = "network.continueWithAuth" -> EmptyResult,
        /// Fail a blocked request.
        FailRequest(network::FailRequest) = "network.failRequest" -> EmptyResult,
        /// Answer a blocked request with a synthetic response.
        ProvideResponse(network::ProvideResponse) = "network.provideResponse" -> EmptyResult,
        /// Remove an intercept.
        RemoveIntercept(network::RemoveIntercept) = "network.removeIntercept" -> EmptyResult,
        /// Change cache behavior.
        SetCacheBehavior(network::SetCacheBehavior) = "network.setCacheBehavior" -> EmptyResult,
    }
}

command_group! {
    /// Script module commands for JavaScript execution.
    ScriptCommand => Script {
        /// Register a preload script.
        AddPreloadScript(script::AddPreloadScript) = "script.addPreloadScript"
            -> script::AddPreloadScriptResult,
        /// Call a function.
        CallFunction(script::CallFunction) = "script.callFunction" -> script::EvaluateResult,
        /// Release handles.
        Disown(script::Disown) = "script.disown" -> EmptyResult,
        /// Evaluate an expression.
        Evaluate(script::Evaluate) = "script.evaluate" -> script::EvaluateResult,
        /// List realms.
        GetRealms(script::GetRealms) = "script.getRealms" -> script::GetRealmsResult,
        /// Remove a preload script.
        RemovePreloadScript(script::RemovePreloadScript) = "script.removePreloadScript"
            -> EmptyResult,
    }
}

command_group! {
    /// Storage module commands for cookies.
    StorageCommand => Storage {
        /// Read cookies.
        GetCookies(storage::GetCookies) = "storage.getCookies" -> storage::GetCookiesResult,
        /// Write a cookie.
        SetCookie(storage::SetCookie) = "storage.setCookie" -> storage::PartitionKeyResult,
        /// Delete cookies.
        DeleteCookies(storage::DeleteCookies) = "storage.deleteCookies"
            -> storage::PartitionKeyResult,
    }
}

command_group! {
    /// WebExtension module commands.
    WebExtensionCommand => WebExtension {
        /// Install an extension.
        Install(web_extension::Install) = "webExtension.install" -> web_extension::InstallResult,
        /// Uninstall an extension.
        Uninstall(web_extension::Uninstall) = "webExtension.uninstall" -> EmptyResult,
    }
}

// ============================================================================
// Tests
// ============================================================================

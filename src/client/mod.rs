//! High-level automation client.
//!
//! [`BidiClient`] composes a [`Session`] with every module manager and adds
//! the shortcuts most automation needs: open a tab, navigate, evaluate,
//! type, click, screenshot, cookies and request interception. Anything more
//! specific goes through the manager accessors.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BidiClient`] | Session plus module managers |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timeouts, limits and capabilities |
//! | [`Key`] | Special key values for input actions |
//!
//! # Example
//!
//! ```no_run
//! use webdriver_bidi::{BidiClient, Key, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = BidiClient::builder()
//!     .endpoint("ws://127.0.0.1:9222/session")
//!     .connect()
//!     .await?;
//!
//! let tab = client.new_tab().await?;
//! client.navigate(&tab, "https://example.com").await?;
//! client.type_text(&tab, "hello").await?;
//! client.press_key(&tab, Key::Enter).await?;
//! client.end().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Special key values.
pub mod keys;

/// Client options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use keys::Key;
pub use options::ClientOptions;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, ErrorCode, Result};
use crate::identifiers::{BrowsingContextId, InterceptId, SessionId};
use crate::modules::{
    BrowserManager, BrowsingContextManager, InputManager, LogManager, NetworkManager,
    ScriptManager, StorageManager, WebExtensionManager, require_items, require_non_empty,
};
use crate::protocol::browsing_context::{
    CaptureScreenshot, Create, CreateType, GetTree, NavigateResult, ReadinessState,
};
use crate::protocol::event::BidiEvent;
use crate::protocol::log::Entry;
use crate::protocol::network::{BeforeRequestSent, Cookie, InterceptPhase, UrlPattern};
use crate::protocol::script::{CallFunction, Evaluate, LocalValue, Target};
use crate::protocol::session::NewResult;
use crate::protocol::storage::PartialCookie;
use crate::session::{Session, SessionState};
use crate::transport::ListenerId;

/// Event the interception helpers subscribe to.
const BEFORE_REQUEST_SENT: &str = "network.beforeRequestSent";

// ============================================================================
// BidiClient
// ============================================================================

/// A WebDriver BiDi session with every module manager attached.
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct BidiClient {
    endpoint: Url,
    options: ClientOptions,
    session: Session,
    browser: BrowserManager,
    browsing_context: BrowsingContextManager,
    input: InputManager,
    log: LogManager,
    network: NetworkManager,
    script: ScriptManager,
    storage: StorageManager,
    web_extension: WebExtensionManager,
}

// ============================================================================
// BidiClient - Display
// ============================================================================

impl fmt::Debug for BidiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BidiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("state", &self.state())
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// BidiClient - Construction & Lifecycle
// ============================================================================

impl BidiClient {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates an unconnected client; see [`ClientBuilder::build`].
    pub(crate) fn new(endpoint: Url, options: ClientOptions) -> Self {
        let session = Session::new(options.connection_options());
        Self {
            endpoint,
            options,
            browser: BrowserManager::new(session.clone()),
            browsing_context: BrowsingContextManager::new(session.clone()),
            input: InputManager::new(session.clone()),
            log: LogManager::new(session.clone()),
            network: NetworkManager::new(session.clone()),
            script: ScriptManager::new(session.clone()),
            storage: StorageManager::new(session.clone()),
            web_extension: WebExtensionManager::new(session.clone()),
            session,
        }
    }

    /// Connects and creates the session with the configured capabilities.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if already started
    /// - connection errors from the handshake
    /// - protocol errors from `session.new`; the session is then ended
    pub async fn start(&self) -> Result<NewResult> {
        self.session.connect(self.endpoint.as_str()).await?;
        let result = self
            .session
            .new_session(self.options.capabilities.clone())
            .await?;

        info!(
            endpoint = %self.endpoint,
            session_id = %result.session_id,
            browser = %result.capabilities.browser_name,
            "Client started"
        );
        Ok(result)
    }

    /// Ends the session and closes the socket; the browser keeps running.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] before the session is established.
    pub async fn end(&self) -> Result<()> {
        self.session.end().await
    }

    /// Closes the browser, which also ends the session.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn close_browser(&self) -> Result<()> {
        self.browser.close().await
    }
}

// ============================================================================
// BidiClient - Accessors
// ============================================================================

impl BidiClient {
    /// Returns the endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the session lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Returns the session id once established.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.session_id()
    }

    /// `browser` commands.
    #[inline]
    #[must_use]
    pub fn browser(&self) -> &BrowserManager {
        &self.browser
    }

    /// `browsingContext` commands.
    #[inline]
    #[must_use]
    pub fn browsing_context(&self) -> &BrowsingContextManager {
        &self.browsing_context
    }

    /// `input` commands.
    #[inline]
    #[must_use]
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// `log` events.
    #[inline]
    #[must_use]
    pub fn log(&self) -> &LogManager {
        &self.log
    }

    /// `network` commands.
    #[inline]
    #[must_use]
    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    /// `script` commands.
    #[inline]
    #[must_use]
    pub fn script(&self) -> &ScriptManager {
        &self.script
    }

    /// `storage` commands.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// `webExtension` commands.
    #[inline]
    #[must_use]
    pub fn web_extension(&self) -> &WebExtensionManager {
        &self.web_extension
    }
}

// ============================================================================
// BidiClient - Contexts
// ============================================================================

impl BidiClient {
    /// Opens a tab and returns its context.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn new_tab(&self) -> Result<BrowsingContextId> {
        let created = self
            .browsing_context
            .create(Create::new(CreateType::Tab))
            .await?;
        debug!(context = %created.context, "Tab opened");
        Ok(created.context)
    }

    /// Returns the first top-level context.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] with `no such frame` if the browser has none
    /// - session and protocol errors
    pub async fn top_level_context(&self) -> Result<BrowsingContextId> {
        let tree = self
            .browsing_context
            .get_tree(GetTree {
                max_depth: Some(0),
                root: None,
            })
            .await?;

        tree.contexts
            .into_iter()
            .next()
            .map(|info| info.context)
            .ok_or_else(|| {
                Error::protocol(ErrorCode::NoSuchFrame, "no top-level browsing context", None)
            })
    }

    /// Closes a tab or window.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn close_context(&self, context: &BrowsingContextId) -> Result<()> {
        self.browsing_context.close(context, false).await
    }

    /// Navigates and waits for the `load` event.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `url` is not absolute
    /// - session and protocol errors
    pub async fn navigate(&self, context: &BrowsingContextId, url: &str) -> Result<NavigateResult> {
        self.browsing_context
            .navigate(context, url, Some(ReadinessState::Complete))
            .await
    }

    /// Captures the viewport as PNG bytes.
    ///
    /// # Errors
    ///
    /// Session, protocol and decode errors.
    pub async fn screenshot(&self, context: &BrowsingContextId) -> Result<Vec<u8>> {
        self.browsing_context
            .capture_screenshot_bytes(CaptureScreenshot::new(context.clone()))
            .await
    }
}

// ============================================================================
// BidiClient - Script & Input
// ============================================================================

impl BidiClient {
    /// Evaluates an expression, awaiting promises, and returns JSON.
    ///
    /// # Errors
    ///
    /// - [`Error::ScriptException`] if the expression throws
    /// - session and protocol errors
    pub async fn evaluate(&self, context: &BrowsingContextId, expression: &str) -> Result<Value> {
        self.script
            .evaluate_json(Evaluate::new(
                expression,
                Target::context(context.clone()),
                true,
            ))
            .await
    }

    /// Calls a function with JSON arguments, awaiting promises.
    ///
    /// # Errors
    ///
    /// Same as [`Self::evaluate`].
    pub async fn call_function(
        &self,
        context: &BrowsingContextId,
        function_declaration: &str,
        arguments: &[Value],
    ) -> Result<Value> {
        let arguments = arguments.iter().map(LocalValue::from_json).collect();
        self.script
            .call_function_json(
                CallFunction::new(
                    function_declaration,
                    Target::context(context.clone()),
                    true,
                )
                .with_arguments(arguments),
            )
            .await
    }

    /// Types text into whatever has focus.
    ///
    /// # Errors
    ///
    /// Session and protocol errors; empty text is rejected locally.
    pub async fn type_text(&self, context: &BrowsingContextId, text: &str) -> Result<()> {
        self.input.type_text(context, text).await
    }

    /// Presses and releases a special key.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn press_key(&self, context: &BrowsingContextId, key: Key) -> Result<()> {
        self.input.press_key(context, key.value()).await
    }

    /// Clicks the primary button at viewport coordinates.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn click_at(&self, context: &BrowsingContextId, x: f64, y: f64) -> Result<()> {
        self.input.click_at(context, x, y, None).await
    }
}

// ============================================================================
// BidiClient - Cookies
// ============================================================================

impl BidiClient {
    /// Sets a cookie in the default partition.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty name or domain
    /// - session and protocol errors
    pub async fn set_cookie(&self, cookie: PartialCookie) -> Result<()> {
        self.storage.set_cookie(cookie, None).await?;
        Ok(())
    }

    /// Returns the first cookie named `name`.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_cookie(&self, name: &str) -> Result<Option<Cookie>> {
        self.storage.get_cookie(name).await
    }

    /// Deletes every cookie in the default partition.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn clear_cookies(&self) -> Result<()> {
        self.storage.delete_cookies(None, None).await?;
        Ok(())
    }
}

// ============================================================================
// BidiClient - Events & Interception
// ============================================================================

impl BidiClient {
    /// Subscribes by attributes to events or whole modules.
    ///
    /// # Errors
    ///
    /// See [`Session::subscribe`].
    pub async fn subscribe(&self, events: &[&str]) -> Result<()> {
        let events = events.iter().map(ToString::to_string).collect();
        self.session.subscribe(events, None).await?;
        Ok(())
    }

    /// Registers a listener for one event method.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the method has no decoder.
    pub fn on<F>(&self, method: &str, listener: F) -> Result<ListenerId>
    where
        F: Fn(&BidiEvent) + Send + Sync + 'static,
    {
        self.session.on(method, listener)
    }

    /// Removes a listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.session.remove_listener(id)
    }

    /// Subscribes to log entries and registers a typed listener.
    ///
    /// The listener is removed again if the subscription fails.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn on_log_entry<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&Entry) + Send + Sync + 'static,
    {
        let id = self.log.on_entry(listener)?;
        if !self.log.is_subscribed()
            && let Err(e) = self.log.subscribe(None).await
        {
            self.session.remove_listener(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Blocks requests matching `patterns` before they are sent.
    ///
    /// Blocked requests arrive as `network.beforeRequestSent` with
    /// `isBlocked` set; resolve each with
    /// [`NetworkManager::continue_request`],
    /// [`NetworkManager::provide_response`] or
    /// [`NetworkManager::fail_request`]. Remove the returned listener with
    /// [`Self::remove_listener`] once the intercept is gone.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for no patterns or an empty one (no I/O)
    /// - session and protocol errors; the listener is removed again
    pub async fn intercept_requests<F>(
        &self,
        patterns: &[&str],
        listener: F,
    ) -> Result<(InterceptId, ListenerId)>
    where
        F: Fn(&BeforeRequestSent) + Send + Sync + 'static,
    {
        require_items("URL patterns", patterns)?;
        let url_patterns = patterns
            .iter()
            .map(|pattern| {
                require_non_empty("URL pattern", pattern)?;
                Ok(UrlPattern::String {
                    pattern: (*pattern).to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let listener = self.network.on_before_request_sent(listener)?;
        match self.block_requests(url_patterns).await {
            Ok(intercept) => Ok((intercept, listener)),
            Err(e) => {
                self.session.remove_listener(listener);
                Err(e)
            }
        }
    }

    async fn block_requests(&self, url_patterns: Vec<UrlPattern>) -> Result<InterceptId> {
        if !self.session.is_subscribed(BEFORE_REQUEST_SENT) {
            self.session
                .subscribe(vec![BEFORE_REQUEST_SENT.to_string()], None)
                .await?;
        }

        self.network
            .add_intercept(
                vec![InterceptPhase::BeforeRequestSent],
                None,
                Some(url_patterns),
            )
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Session lifecycle and subscriptions.
//!
//! A [`Session`] sequences one connection through
//! `Unconnected → Connecting → AwaitingNew → Active → Ending → Ended` and
//! owns the negotiated capabilities and the subscription set.
//!
//! # Example
//!
//! ```ignore
//! use webdriver_bidi::session::Session;
//! use webdriver_bidi::protocol::session::CapabilitiesRequest;
//!
//! let session = Session::new(Default::default());
//! session.connect("ws://127.0.0.1:9222/session").await?;
//! session.new_session(CapabilitiesRequest::default()).await?;
//! session.subscribe(vec!["log.entryAdded".into()], None).await?;
//! // ...
//! session.end().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Subscription bookkeeping.
pub mod subscription;

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::codec::Codec;
use crate::error::{Error, ErrorCode, Result};
use crate::identifiers::{BrowsingContextId, SessionId, SubscriptionId};
use crate::protocol::session::{
    self, CapabilitiesRequest, NewResult, SessionCapabilities, StatusResult, SubscribeResult,
    Unsubscribe,
};
use crate::protocol::{BidiCommand, BidiEvent};
use crate::transport::{Connection, ConnectionOptions, EventDispatcher, ListenerId};

pub use subscription::{Subscription, SubscriptionMode, SubscriptionSet};

// ============================================================================
// SessionState
// ============================================================================

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No socket yet.
    Unconnected,
    /// Socket is opening.
    Connecting,
    /// Socket open; `session.new` not yet answered.
    AwaitingNew,
    /// Session established.
    Active,
    /// `session.end` in flight; no new commands accepted.
    Ending,
    /// Terminal.
    Ended,
}

impl SessionState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconnected => "unconnected",
            Self::Connecting => "connecting",
            Self::AwaitingNew => "awaiting-new",
            Self::Active => "active",
            Self::Ending => "ending",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Types
// ============================================================================

/// Identity and capabilities of an established session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    /// Session id.
    pub id: SessionId,
    /// Capabilities the remote end granted.
    pub capabilities: SessionCapabilities,
}

struct Inner {
    codec: Arc<Codec>,
    dispatcher: Arc<EventDispatcher>,
    options: ConnectionOptions,
    state: Mutex<SessionState>,
    connection: Mutex<Option<Connection>>,
    info: Mutex<Option<SessionInfo>>,
    subscriptions: Mutex<SubscriptionSet>,
}

impl Inner {
    fn set_state(&self, next: SessionState) {
        let mut state = self.state.lock();
        if *state != next {
            debug!(from = %*state, to = %next, "Session state changed");
            *state = next;
        }
    }

    fn connection(&self) -> Result<Connection> {
        let connection = self.connection.lock().clone();
        connection.ok_or_else(|| Error::invalid_state("connected", self.state.lock().as_str()))
    }

    /// Terminal transition; idempotent.
    fn finish(&self) {
        self.set_state(SessionState::Ended);
        self.subscriptions.lock().clear();
        if let Some(connection) = self.connection.lock().take() {
            connection.close();
        }
    }

    fn on_transport_closed(&self) {
        let previous = *self.state.lock();
        if previous == SessionState::Ended {
            return;
        }
        info!(state = %previous, "Transport closed; session ended");
        self.finish();
    }
}

// ============================================================================
// Session
// ============================================================================

/// One BiDi session over one connection.
///
/// Cheap to clone; clones share state. Dropping the last clone closes the
/// socket.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("id", &self.session_id())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates an unconnected session.
    #[must_use]
    pub fn new(options: ConnectionOptions) -> Self {
        let codec = Arc::new(Codec::new());
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&codec)));

        Self {
            inner: Arc::new(Inner {
                codec,
                dispatcher,
                options,
                state: Mutex::new(SessionState::Unconnected),
                connection: Mutex::new(None),
                info: Mutex::new(None),
                subscriptions: Mutex::new(SubscriptionSet::default()),
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    /// Returns `true` while commands are accepted.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Returns the session id once established.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.info.lock().as_ref().map(|info| info.id.clone())
    }

    /// Returns the granted capabilities once established.
    #[must_use]
    pub fn capabilities(&self) -> Option<SessionCapabilities> {
        self.inner
            .info
            .lock()
            .as_ref()
            .map(|info| info.capabilities.clone())
    }

    /// Returns a snapshot of the subscription set.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.subscriptions.lock().entries().to_vec()
    }

    /// Returns `true` if a subscription covers `method`.
    #[must_use]
    pub fn is_subscribed(&self, method: &str) -> bool {
        self.inner.subscriptions.lock().covers(method)
    }

    /// Returns the codec shared with the transport.
    #[inline]
    #[must_use]
    pub fn codec(&self) -> &Arc<Codec> {
        &self.inner.codec
    }

    /// Returns the event dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.inner.dispatcher
    }

    /// Returns the transport limits.
    #[inline]
    #[must_use]
    pub fn options(&self) -> ConnectionOptions {
        self.inner.options
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a listener for one event method.
    ///
    /// Listeners may be registered in any state; events only flow once a
    /// matching subscription exists.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `method` has no typed decoder.
    pub fn on<F>(&self, method: &str, listener: F) -> Result<ListenerId>
    where
        F: Fn(&BidiEvent) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on(method, listener)
    }

    /// Registers a listener for every event.
    pub fn on_any<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&BidiEvent) + Send + Sync + 'static,
    {
        self.inner.dispatcher.on_any(listener)
    }

    /// Removes a listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.dispatcher.remove(id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens the socket. `Unconnected → Connecting → AwaitingNew`.
    ///
    /// On failure the session returns to `Unconnected` and may be retried.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `Unconnected`
    /// - [`Error::Connection`] / [`Error::ConnectionTimeout`] from the transport
    pub async fn connect(&self, endpoint: &str) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if *state != SessionState::Unconnected {
                return Err(Error::invalid_state(
                    SessionState::Unconnected.as_str(),
                    state.as_str(),
                ));
            }
            *state = SessionState::Connecting;
        }

        let connection = match Connection::connect(
            endpoint,
            Arc::clone(&self.inner.codec),
            Arc::clone(&self.inner.dispatcher),
            self.inner.options,
        )
        .await
        {
            Ok(connection) => connection,
            Err(e) => {
                warn!(endpoint, error = %e, "Connect failed");
                self.inner.set_state(SessionState::Unconnected);
                return Err(e);
            }
        };

        self.attach(connection);
        Ok(())
    }

    /// Attaches an open connection and watches it for closure.
    fn attach(&self, connection: Connection) {
        let mut closed = connection.closed_receiver();
        *self.inner.connection.lock() = Some(connection);
        self.inner.set_state(SessionState::AwaitingNew);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let _ = closed.wait_for(|closed| *closed).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_transport_closed();
            }
        });
    }

    /// Issues `session.new`. `AwaitingNew → Active`, or `Ended` on error.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] unless `AwaitingNew`
    /// - [`Error::Protocol`] (typically `session not created`); the session
    ///   is then `Ended`
    pub async fn new_session(&self, capabilities: CapabilitiesRequest) -> Result<NewResult> {
        let state = self.state();
        if state != SessionState::AwaitingNew {
            return Err(Error::invalid_state(
                SessionState::AwaitingNew.as_str(),
                state.as_str(),
            ));
        }

        let connection = self.inner.connection()?;

        match connection.send(session::New { capabilities }).await {
            Ok(result) => {
                *self.inner.info.lock() = Some(SessionInfo {
                    id: result.session_id.clone(),
                    capabilities: result.capabilities.clone(),
                });
                self.inner.set_state(SessionState::Active);
                info!(
                    session_id = %result.session_id,
                    browser = %result.capabilities.browser_name,
                    version = %result.capabilities.browser_version,
                    "Session established"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "session.new failed");
                self.inner.finish();
                Err(e)
            }
        }
    }

    /// Issues `session.status`. Allowed whenever the socket is open.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if not connected, else transport errors.
    pub async fn status(&self) -> Result<StatusResult> {
        match self.state() {
            SessionState::AwaitingNew | SessionState::Active => {}
            SessionState::Ending | SessionState::Ended => return Err(Error::SessionEnded),
            other => return Err(Error::invalid_state("connected", other.as_str())),
        }
        self.inner.connection()?.send(session::Status {}).await
    }

    /// Ends the session. `Active → Ending → Ended`.
    ///
    /// Commands still pending fail with [`Error::SessionEnded`]. A socket
    /// that closes before answering `session.end` counts as success.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionEnded`] if already ending or ended
    /// - [`Error::InvalidState`] if never established
    /// - [`Error::Protocol`] if the remote end refuses
    pub async fn end(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                SessionState::Active => {
                    debug!(from = %*state, to = %SessionState::Ending, "Session state changed");
                    *state = SessionState::Ending;
                }
                SessionState::Ending | SessionState::Ended => return Err(Error::SessionEnded),
                other => {
                    return Err(Error::invalid_state(
                        SessionState::Active.as_str(),
                        other.as_str(),
                    ));
                }
            }
        }

        let connection = self.inner.connection.lock().clone();
        let result = match connection {
            Some(connection) => {
                let failed = connection.fail_pending(|| Error::SessionEnded);
                if failed > 0 {
                    debug!(failed, "Failed pending commands on session end");
                }

                match connection.send(session::End {}).await {
                    Ok(_) | Err(Error::TransportClosed) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };

        self.inner.finish();
        info!(ok = result.is_ok(), "Session ended");
        result
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Sends a typed command with the default timeout.
    ///
    /// # Errors
    ///
    /// See [`Session::send_with_timeout`].
    pub async fn send<C: BidiCommand>(&self, params: C) -> Result<C::Output> {
        self.send_with_timeout(params, self.inner.options.command_timeout)
            .await
    }

    /// Sends a typed command.
    ///
    /// Registration happens under the state lock, so a command is either
    /// registered before `end()` starts or rejected.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionEnded`] once ending or ended, or if `end()` starts
    ///   while waiting
    /// - [`Error::InvalidState`] before the session is established
    /// - transport, protocol and decode errors
    pub async fn send_with_timeout<C: BidiCommand>(
        &self,
        params: C,
        request_timeout: Duration,
    ) -> Result<C::Output> {
        let pending = {
            let state = self.inner.state.lock();
            match *state {
                SessionState::Active => {}
                SessionState::Ending | SessionState::Ended => return Err(Error::SessionEnded),
                other => {
                    return Err(Error::invalid_state(
                        SessionState::Active.as_str(),
                        other.as_str(),
                    ));
                }
            }

            let connection = self
                .inner
                .connection
                .lock()
                .clone()
                .ok_or(Error::SessionEnded)?;
            connection.register(&params.into())?
        };

        let value = pending.wait(request_timeout).await?;
        self.inner.codec.decode(value)
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Subscribes by attributes; revoke with [`Session::unsubscribe`].
    ///
    /// An identical tuple already recorded is not re-requested; the existing
    /// entry's id is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `events` is empty (no I/O)
    /// - errors from [`Session::send`]
    pub async fn subscribe(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<SubscribeResult> {
        self.subscribe_in_mode(events, contexts, SubscriptionMode::ByAttributes)
            .await
    }

    /// Subscribes and returns the remote-issued id; revoke with
    /// [`Session::unsubscribe_by_id`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `events` is empty (no I/O)
    /// - [`Error::Protocol`] with `unsupported operation` if the remote end
    ///   issues no id; the subscription is then recorded by attributes
    /// - errors from [`Session::send`]
    pub async fn subscribe_by_id(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<SubscriptionId> {
        let result = self
            .subscribe_in_mode(events, contexts, SubscriptionMode::ById)
            .await?;

        result.subscription.ok_or_else(|| {
            Error::protocol(
                ErrorCode::UnsupportedOperation,
                "remote end issued no subscription id; revoke by attributes",
                None,
            )
        })
    }

    async fn subscribe_in_mode(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
        mode: SubscriptionMode,
    ) -> Result<SubscribeResult> {
        validate_events(&events)?;
        validate_contexts(contexts.as_deref())?;

        let event_set: BTreeSet<String> = events.iter().cloned().collect();
        let context_set: Option<BTreeSet<BrowsingContextId>> =
            contexts.as_ref().map(|c| c.iter().cloned().collect());

        if mode == SubscriptionMode::ByAttributes {
            let existing = self
                .inner
                .subscriptions
                .lock()
                .find_attribute_entry(&event_set, context_set.as_ref())
                .map(|s| s.id.clone());
            if let Some(subscription) = existing {
                debug!(events = ?event_set, "Already subscribed");
                return Ok(SubscribeResult { subscription });
            }
        }

        let result = self
            .send(session::Subscribe {
                events,
                contexts,
                user_contexts: None,
            })
            .await?;

        // Without an id there is nothing to revoke by.
        let mode = if result.subscription.is_some() {
            mode
        } else {
            SubscriptionMode::ByAttributes
        };

        debug!(
            events = ?event_set,
            subscription = ?result.subscription,
            ?mode,
            "Subscribed"
        );

        let recorded = self.inner.subscriptions.lock().insert(Subscription {
            id: result.subscription.clone(),
            events: event_set,
            contexts: context_set,
            mode,
        });
        if !recorded {
            debug!("Concurrent identical subscription already recorded");
        }

        Ok(result)
    }

    /// Revokes an attribute-mode subscription with the identical event and
    /// context list.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `events` is empty (no I/O)
    /// - [`Error::Protocol`] with `invalid argument` if nothing matches or
    ///   the match was created by id (no I/O)
    /// - errors from [`Session::send`]
    pub async fn unsubscribe(
        &self,
        events: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<()> {
        validate_events(&events)?;

        let event_set: BTreeSet<String> = events.iter().cloned().collect();
        let context_set: Option<BTreeSet<BrowsingContextId>> =
            contexts.as_ref().map(|c| c.iter().cloned().collect());

        self.inner
            .subscriptions
            .lock()
            .find_by_attributes(&event_set, context_set.as_ref())?;

        self.send(Unsubscribe::ByAttributes { events, contexts })
            .await?;

        // Re-resolve: the set may have changed while waiting.
        let mut subscriptions = self.inner.subscriptions.lock();
        if let Ok(index) = subscriptions.find_by_attributes(&event_set, context_set.as_ref()) {
            subscriptions.remove_indices(vec![index]);
        }
        debug!(events = ?event_set, remaining = subscriptions.len(), "Unsubscribed");
        Ok(())
    }

    /// Revokes id-mode subscriptions.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `ids` is empty (no I/O)
    /// - [`Error::Protocol`] with `invalid argument` for an unknown id or one
    ///   created by attributes (no I/O)
    /// - errors from [`Session::send`]
    pub async fn unsubscribe_by_id(&self, ids: Vec<SubscriptionId>) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::invalid_argument("subscription id list is empty"));
        }

        self.inner.subscriptions.lock().find_by_ids(&ids)?;

        self.send(Unsubscribe::ById {
            subscriptions: ids.clone(),
        })
        .await?;

        let mut subscriptions = self.inner.subscriptions.lock();
        if let Ok(indices) = subscriptions.find_by_ids(&ids) {
            subscriptions.remove_indices(indices);
        }
        debug!(?ids, remaining = subscriptions.len(), "Unsubscribed by id");
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_events(events: &[String]) -> Result<()> {
    if events.is_empty() {
        return Err(Error::invalid_argument("event list is empty"));
    }
    if let Some(bad) = events.iter().find(|e| e.trim().is_empty()) {
        return Err(Error::invalid_argument(format!("invalid event name {bad:?}")));
    }
    Ok(())
}

fn validate_contexts(contexts: Option<&[BrowsingContextId]>) -> Result<()> {
    match contexts {
        Some([]) => Err(Error::invalid_argument(
            "context list is empty; omit it to subscribe globally",
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

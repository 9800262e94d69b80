//! `log` events: console calls and uncaught errors.
//!
//! The module has no commands. [`LogManager`] manages the
//! `log.entryAdded` subscription and registers typed listeners.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::identifiers::BrowsingContextId;
use crate::protocol::event::BidiEvent;
use crate::protocol::log::{Entry, Level};
use crate::session::Session;
use crate::transport::ListenerId;

/// The only `log` event.
const ENTRY_ADDED: &str = "log.entryAdded";

// ============================================================================
// LogManager
// ============================================================================

/// Events of the `log` module.
#[derive(Debug, Clone)]
pub struct LogManager {
    session: Session,
}

impl LogManager {
    /// Creates a manager for `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Subscribes to log entries, globally or for some contexts.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn subscribe(&self, contexts: Option<Vec<BrowsingContextId>>) -> Result<()> {
        self.session
            .subscribe(vec![ENTRY_ADDED.to_string()], contexts)
            .await?;
        Ok(())
    }

    /// Revokes a subscription made with the same `contexts`.
    ///
    /// # Errors
    ///
    /// Session and protocol errors; no matching subscription is
    /// `invalid argument`.
    pub async fn unsubscribe(&self, contexts: Option<Vec<BrowsingContextId>>) -> Result<()> {
        self.session
            .unsubscribe(vec![ENTRY_ADDED.to_string()], contexts)
            .await
    }

    /// Returns whether log entries are currently delivered.
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.session.is_subscribed(ENTRY_ADDED)
    }

    /// Registers a listener for every log entry.
    ///
    /// # Errors
    ///
    /// Never in practice; the method always has a decoder.
    pub fn on_entry<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&Entry) + Send + Sync + 'static,
    {
        self.session.on(ENTRY_ADDED, move |event| {
            if let BidiEvent::LogEntryAdded(entry) = event {
                listener(entry);
            }
        })
    }

    /// Registers a listener for entries at [`Level::Error`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::on_entry`].
    pub fn on_error<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&Entry) + Send + Sync + 'static,
    {
        self.on_entry(move |entry| {
            if entry.level() == Level::Error {
                listener(entry);
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

//! `browser` commands: user contexts and OS windows.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{ClientWindowId, UserContextId};
use crate::protocol::browser::{
    ClientWindowInfo, ClientWindowState, Close, CreateUserContext, GetClientWindows,
    GetUserContexts, RemoveUserContext, SetClientWindowState, UserContextInfo,
};
use crate::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Id of the user context every browser starts with.
pub const DEFAULT_USER_CONTEXT: &str = "default";

// ============================================================================
// BrowserManager
// ============================================================================

/// Commands of the `browser` module.
#[derive(Debug, Clone)]
pub struct BrowserManager {
    session: Session,
}

impl BrowserManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Closes every window and ends the session on the remote side.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn close(&self) -> Result<()> {
        match self.session.send(Close {}).await {
            // The remote end may drop the socket before answering.
            Ok(_) | Err(Error::TransportClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Creates an isolated user context (profile-like cookie jar).
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn create_user_context(&self, params: CreateUserContext) -> Result<UserContextInfo> {
        let info = self.session.send(params).await?;
        debug!(user_context = %info.user_context, "User context created");
        Ok(info)
    }

    /// Lists OS windows.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_client_windows(&self) -> Result<Vec<ClientWindowInfo>> {
        Ok(self.session.send(GetClientWindows {}).await?.client_windows)
    }

    /// Lists user contexts, the default one included.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_user_contexts(&self) -> Result<Vec<UserContextInfo>> {
        Ok(self.session.send(GetUserContexts {}).await?.user_contexts)
    }

    /// Removes a user context and closes its contexts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for the default user context
    /// - session and protocol errors
    pub async fn remove_user_context(&self, user_context: &UserContextId) -> Result<()> {
        if user_context.as_str() == DEFAULT_USER_CONTEXT {
            return Err(Error::invalid_argument(
                "the default user context cannot be removed",
            ));
        }

        self.session
            .send(RemoveUserContext {
                user_context: user_context.clone(),
            })
            .await?;
        Ok(())
    }

    /// Changes an OS window's state and returns its new geometry.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a zero width or height
    /// - session and protocol errors
    pub async fn set_client_window_state(
        &self,
        client_window: &ClientWindowId,
        state: ClientWindowState,
    ) -> Result<ClientWindowInfo> {
        if let ClientWindowState::Normal { width, height, .. } = &state
            && (*width == Some(0) || *height == Some(0))
        {
            return Err(Error::invalid_argument("window size must be positive"));
        }

        self.session
            .send(SetClientWindowState {
                client_window: client_window.clone(),
                state,
            })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

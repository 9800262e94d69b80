//! Client configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use webdriver_bidi::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_command_timeout(Duration::from_secs(10))
//!     .with_max_pending(64)
//!     .with_accept_insecure_certs();
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::session::{CapabilitiesRequest, CapabilityRequest};
use crate::transport::{
    ConnectionOptions, DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_PENDING,
};

// ============================================================================
// ClientOptions
// ============================================================================

/// Timeouts, limits and requested capabilities for a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// How long a command waits for its response.
    pub command_timeout: Duration,

    /// How long the WebSocket handshake may take.
    pub connect_timeout: Duration,

    /// Maximum number of commands awaiting a response.
    pub max_pending: usize,

    /// Capabilities sent with `session.new`.
    pub capabilities: CapabilitiesRequest,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the default timeouts and no capabilities.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending: DEFAULT_MAX_PENDING,
            capabilities: CapabilitiesRequest::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the command timeout.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the pending-command cap.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Replaces the requested capabilities.
    #[inline]
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: CapabilitiesRequest) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Requires a browser by name in `alwaysMatch`.
    #[must_use]
    pub fn with_browser_name(mut self, name: impl Into<String>) -> Self {
        self.always_match().browser_name = Some(name.into());
        self
    }

    /// Accepts invalid TLS certificates.
    #[must_use]
    pub fn with_accept_insecure_certs(mut self) -> Self {
        self.always_match().accept_insecure_certs = Some(true);
        self
    }

    fn always_match(&mut self) -> &mut CapabilityRequest {
        self.capabilities
            .always_match
            .get_or_insert_with(CapabilityRequest::default)
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ClientOptions {
    /// Returns the transport part of the options.
    #[inline]
    #[must_use]
    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            command_timeout: self.command_timeout,
            connect_timeout: self.connect_timeout,
            max_pending: self.max_pending,
        }
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a zero timeout or a zero pending cap.
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout.is_zero() {
            return Err(Error::invalid_argument("command timeout must be positive"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::invalid_argument("connect timeout must be positive"));
        }
        if self.max_pending == 0 {
            return Err(Error::invalid_argument(
                "max pending commands must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use webdriver_bidi::BidiClient;
//!
//! # async fn example() -> webdriver_bidi::Result<()> {
//! let client = BidiClient::builder()
//!     .endpoint("ws://127.0.0.1:9222/session")
//!     .command_timeout(Duration::from_secs(10))
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::protocol::session::CapabilitiesRequest;
use crate::transport::connection::parse_endpoint;

use super::BidiClient;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for a [`BidiClient`].
///
/// Use [`BidiClient::builder()`] to create one.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    /// WebSocket endpoint of the remote end.
    endpoint: Option<String>,
    /// Timeouts, limits and capabilities.
    options: ClientOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default options and no endpoint.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the WebSocket endpoint (`ws://` or `wss://`).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the command timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Sets the pending-command cap.
    #[inline]
    #[must_use]
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.options.max_pending = max_pending;
        self
    }

    /// Sets the capabilities sent with `session.new`.
    #[inline]
    #[must_use]
    pub fn capabilities(mut self, capabilities: CapabilitiesRequest) -> Self {
        self.options.capabilities = capabilities;
        self
    }

    /// Replaces every option at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds an unconnected client.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if no endpoint is set or an option is
    ///   out of range
    /// - [`Error::Connection`] if the endpoint is not a `ws`/`wss` URL
    pub fn build(self) -> Result<BidiClient> {
        let endpoint = self.validate_endpoint()?;
        self.options.validate()?;

        Ok(BidiClient::new(endpoint, self.options))
    }

    /// Builds the client, connects and creates the session.
    ///
    /// # Errors
    ///
    /// Errors from [`Self::build`] and [`BidiClient::start`].
    pub async fn connect(self) -> Result<BidiClient> {
        let client = self.build()?;
        client.start().await?;
        Ok(client)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<Url> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            Error::invalid_argument(
                "endpoint is required. Use .endpoint() to set it.\n\
                 Example: BidiClient::builder().endpoint(\"ws://127.0.0.1:9222/session\")",
            )
        })?;

        parse_endpoint(endpoint)
    }
}

// ============================================================================
// Tests
// ============================================================================

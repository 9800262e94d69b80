//! Per-module command managers.
//!
//! Each manager wraps a [`Session`](crate::session::Session) and exposes one
//! call per wire command. Arguments are validated locally first; a
//! validation failure returns [`Error::InvalidArgument`] without touching
//! the socket. Nothing here retries.
//!
//! # Managers
//!
//! | Manager | Module |
//! |---------|--------|
//! | [`BrowserManager`] | `browser` |
//! | [`BrowsingContextManager`] | `browsingContext` |
//! | [`InputManager`] | `input` |
//! | [`LogManager`] | `log` (events only) |
//! | [`NetworkManager`] | `network` |
//! | [`ScriptManager`] | `script` |
//! | [`StorageManager`] | `storage` |
//! | [`WebExtensionManager`] | `webExtension` |
//!
//! The `session` module itself is managed by
//! [`Session`](crate::session::Session).

// ============================================================================
// Submodules
// ============================================================================

pub mod browser;
pub mod browsing_context;
pub mod input;
pub mod log;
pub mod network;
pub mod script;
pub mod storage;
pub mod web_extension;

// ============================================================================
// Re-exports
// ============================================================================

pub use browser::BrowserManager;
pub use browsing_context::BrowsingContextManager;
pub use input::InputManager;
pub use log::LogManager;
pub use network::NetworkManager;
pub use script::ScriptManager;
pub use storage::StorageManager;
pub use web_extension::WebExtensionManager;

// ============================================================================
// Validation Helpers
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

/// Rejects an empty or whitespace-only string.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Rejects an empty list.
pub(crate) fn require_items<T>(field: &str, items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::invalid_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Rejects a string that is not an absolute URL.
pub(crate) fn require_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| Error::invalid_argument(format!("{field} {value:?} is not a valid URL: {e}")))
}

/// Rejects a value outside `range`.
pub(crate) fn require_range(
    field: &str,
    value: f64,
    range: std::ops::RangeInclusive<f64>,
) -> Result<()> {
    if !range.contains(&value) {
        return Err(Error::invalid_argument(format!(
            "{field} must be within {}..={}, got {value}",
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

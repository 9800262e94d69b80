//! `webExtension` commands.

use tracing::info;

use crate::error::Result;
use crate::identifiers::ExtensionId;
use crate::protocol::web_extension::{ExtensionData, Install, Uninstall};
use crate::session::Session;

use super::require_non_empty;

// ============================================================================
// WebExtensionManager
// ============================================================================

/// Commands of the `webExtension` module.
#[derive(Debug, Clone)]
pub struct WebExtensionManager {
    session: Session,
}

impl WebExtensionManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Installs an extension for the rest of the session.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidArgument`] for an empty path or archive
    /// - session and protocol errors
    pub async fn install(&self, extension_data: ExtensionData) -> Result<ExtensionId> {
        match &extension_data {
            ExtensionData::Path { path } | ExtensionData::ArchivePath { path } => {
                require_non_empty("extension path", path)?;
            }
            ExtensionData::Base64 { value } => require_non_empty("extension archive", value)?,
        }

        let extension = self
            .session
            .send(Install { extension_data })
            .await?
            .extension;
        info!(extension = %extension, "Extension installed");
        Ok(extension)
    }

    /// Uninstalls an extension.
    ///
    /// # Errors
    ///
    /// Session and protocol errors; an unknown id is `no such web extension`.
    pub async fn uninstall(&self, extension: &ExtensionId) -> Result<()> {
        self.session
            .send(Uninstall {
                extension: extension.clone(),
            })
            .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

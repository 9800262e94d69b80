//! `webExtension` module: install and uninstall extensions.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::identifiers::ExtensionId;

// ============================================================================
// Types
// ============================================================================

/// Where the remote end loads an extension from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExtensionData {
    /// Unpacked directory on the remote host.
    Path {
        /// Directory path.
        path: String,
    },
    /// Packed archive on the remote host.
    ArchivePath {
        /// Archive path.
        path: String,
    },
    /// Packed archive sent inline.
    Base64 {
        /// Base64 archive bytes.
        value: String,
    },
}

impl ExtensionData {
    /// Inline archive from raw bytes.
    #[inline]
    #[must_use]
    pub fn from_archive_bytes(bytes: &[u8]) -> Self {
        Self::Base64 {
            value: STANDARD.encode(bytes),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// `webExtension.install`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Install {
    /// Extension source.
    pub extension_data: ExtensionData,
}

/// Result of `webExtension.install`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResult {
    /// Installed extension id.
    pub extension: ExtensionId,
}

/// `webExtension.uninstall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uninstall {
    /// Extension to remove.
    pub extension: ExtensionId,
}

// ============================================================================
// Tests
// ============================================================================

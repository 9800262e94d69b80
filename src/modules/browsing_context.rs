//! `browsingContext` commands.
//!
//! Tabs, windows and frames: tree inspection, navigation, screenshots,
//! printing, user prompts and node location.
//!
//! # Example
//!
//! ```ignore
//! let contexts = BrowsingContextManager::new(session.clone());
//! let tab = contexts.create(Create::new(CreateType::Tab)).await?.context;
//! contexts.navigate(&tab, "https://example.com", Some(ReadinessState::Complete)).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::BrowsingContextId;
use crate::protocol::browsing_context::{
    Activate, CaptureScreenshot, CaptureScreenshotResult, ClipRectangle, Close, Create,
    CreateResult, GetTree, GetTreeResult, HandleUserPrompt, Info, LocateNodes, LocateNodesResult,
    Locator, Navigate, NavigateResult, Print, PrintResult, ReadinessState, Reload, SetViewport,
    TraverseHistory,
};
use crate::session::Session;

use super::{require_non_empty, require_range, require_url};

// ============================================================================
// Constants
// ============================================================================

/// Allowed `print` scale.
const PRINT_SCALE: std::ops::RangeInclusive<f64> = 0.1..=2.0;

/// Allowed lossy image quality.
const IMAGE_QUALITY: std::ops::RangeInclusive<f64> = 0.0..=1.0;

// ============================================================================
// BrowsingContextManager
// ============================================================================

/// Commands of the `browsingContext` module.
#[derive(Debug, Clone)]
pub struct BrowsingContextManager {
    session: Session,
}

impl BrowsingContextManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Focuses a top-level context.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn activate(&self, context: &BrowsingContextId) -> Result<()> {
        self.session
            .send(Activate {
                context: context.clone(),
            })
            .await?;
        Ok(())
    }

    /// Captures a screenshot and returns the base64 payload.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a quality outside `0.0..=1.0`, an
    ///   empty MIME type or a box clip with non-positive size
    /// - session and protocol errors
    pub async fn capture_screenshot(
        &self,
        params: CaptureScreenshot,
    ) -> Result<CaptureScreenshotResult> {
        if let Some(format) = &params.format {
            require_non_empty("image type", &format.mime_type)?;
            if let Some(quality) = format.quality {
                require_range("image quality", quality, IMAGE_QUALITY)?;
            }
        }
        if let Some(ClipRectangle::Box { width, height, .. }) = params.clip
            && (width <= 0.0 || height <= 0.0)
        {
            return Err(Error::invalid_argument("clip box must have a positive size"));
        }

        self.session.send(params).await
    }

    /// Captures a screenshot and decodes it to image bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::capture_screenshot`], plus [`Error::Decode`] if the
    /// payload is not base64.
    pub async fn capture_screenshot_bytes(&self, params: CaptureScreenshot) -> Result<Vec<u8>> {
        let result = self.capture_screenshot(params).await?;
        decode_base64("CaptureScreenshotResult", &result.data)
    }

    /// Closes a top-level context.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn close(&self, context: &BrowsingContextId, prompt_unload: bool) -> Result<()> {
        self.session
            .send(Close {
                context: context.clone(),
                prompt_unload: prompt_unload.then_some(true),
            })
            .await?;
        Ok(())
    }

    /// Opens a new tab or window.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn create(&self, params: Create) -> Result<CreateResult> {
        let result = self.session.send(params).await?;
        debug!(context = %result.context, "Browsing context created");
        Ok(result)
    }

    /// Returns the context tree.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_tree(&self, params: GetTree) -> Result<GetTreeResult> {
        self.session.send(params).await
    }

    /// Returns every top-level context with its descendants flattened.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn all_contexts(&self) -> Result<Vec<Info>> {
        let tree = self.get_tree(GetTree::default()).await?;
        Ok(tree
            .contexts
            .iter()
            .flat_map(Info::walk)
            .map(|info| Info {
                children: None,
                ..info.clone()
            })
            .collect())
    }

    /// Accepts or dismisses an open user prompt.
    ///
    /// # Errors
    ///
    /// Session and protocol errors (`no such alert` if none is open).
    pub async fn handle_user_prompt(
        &self,
        context: &BrowsingContextId,
        accept: bool,
        user_text: Option<String>,
    ) -> Result<()> {
        self.session
            .send(HandleUserPrompt {
                context: context.clone(),
                accept: Some(accept),
                user_text,
            })
            .await?;
        Ok(())
    }

    /// Finds nodes matching a locator.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for `max_node_count == 0`, an empty
    ///   start node list or an empty CSS/XPath/text value
    /// - session and protocol errors
    pub async fn locate_nodes(&self, params: LocateNodes) -> Result<LocateNodesResult> {
        if params.max_node_count == Some(0) {
            return Err(Error::invalid_argument("max node count must be at least 1"));
        }
        if params.start_nodes.as_ref().is_some_and(Vec::is_empty) {
            return Err(Error::invalid_argument(
                "start nodes must not be empty; omit them to search the document",
            ));
        }
        match &params.locator {
            Locator::Css { value } => require_non_empty("CSS selector", value)?,
            Locator::XPath { value } => require_non_empty("XPath expression", value)?,
            Locator::InnerText { value, .. } => require_non_empty("inner text", value)?,
            Locator::Accessibility { .. } | Locator::Context { .. } => {}
        }

        self.session.send(params).await
    }

    /// Navigates a context to `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `url` is not absolute
    /// - session and protocol errors
    pub async fn navigate(
        &self,
        context: &BrowsingContextId,
        url: &str,
        wait: Option<ReadinessState>,
    ) -> Result<NavigateResult> {
        require_url("navigation URL", url)?;

        let result = self
            .session
            .send(Navigate {
                context: context.clone(),
                url: url.to_string(),
                wait,
            })
            .await?;

        debug!(%context, url = %result.url, navigation = ?result.navigation, "Navigated");
        Ok(result)
    }

    /// Prints a context to PDF and returns the base64 payload.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a scale outside `0.1..=2.0`, a
    ///   negative margin or a non-positive page size
    /// - session and protocol errors
    pub async fn print(&self, params: Print) -> Result<PrintResult> {
        if let Some(scale) = params.scale {
            require_range("print scale", scale, PRINT_SCALE)?;
        }
        if let Some(margin) = &params.margin {
            let sides = [margin.top, margin.bottom, margin.left, margin.right];
            if sides.into_iter().flatten().any(|side| side < 0.0) {
                return Err(Error::invalid_argument("print margins must not be negative"));
            }
        }
        if let Some(page) = &params.page {
            let sides = [page.width, page.height];
            if sides.into_iter().flatten().any(|side| side <= 0.0) {
                return Err(Error::invalid_argument("page size must be positive"));
            }
        }

        self.session.send(params).await
    }

    /// Prints a context and decodes the PDF bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::print`], plus [`Error::Decode`] if the payload is not
    /// base64.
    pub async fn print_bytes(&self, params: Print) -> Result<Vec<u8>> {
        let result = self.print(params).await?;
        decode_base64("PrintResult", &result.data)
    }

    /// Reloads a context.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn reload(
        &self,
        context: &BrowsingContextId,
        ignore_cache: bool,
        wait: Option<ReadinessState>,
    ) -> Result<NavigateResult> {
        self.session
            .send(Reload {
                context: context.clone(),
                ignore_cache: ignore_cache.then_some(true),
                wait,
            })
            .await
    }

    /// Sets the viewport of a context or of user contexts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if both or neither of context and user
    ///   contexts are given, or the device pixel ratio is not positive
    /// - session and protocol errors
    pub async fn set_viewport(&self, params: SetViewport) -> Result<()> {
        match (&params.context, &params.user_contexts) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid_argument(
                    "set either a context or user contexts, not both",
                ));
            }
            (None, None) => {
                return Err(Error::invalid_argument("a context or user contexts is required"));
            }
            (None, Some(user_contexts)) if user_contexts.is_empty() => {
                return Err(Error::invalid_argument("user contexts must not be empty"));
            }
            _ => {}
        }
        if let Some(ratio) = params.device_pixel_ratio
            && ratio <= 0.0
        {
            return Err(Error::invalid_argument("device pixel ratio must be positive"));
        }

        self.session.send(params).await?;
        Ok(())
    }

    /// Moves `delta` steps through session history.
    ///
    /// # Errors
    ///
    /// Session and protocol errors (`no such history entry` if out of range).
    pub async fn traverse_history(&self, context: &BrowsingContextId, delta: i64) -> Result<()> {
        self.session
            .send(TraverseHistory {
                context: context.clone(),
                delta,
            })
            .await?;
        Ok(())
    }
}

/// Decodes a base64 payload returned by the remote end.
pub(crate) fn decode_base64(type_name: &str, data: &str) -> Result<Vec<u8>> {
    Base64Standard
        .decode(data)
        .map_err(|e| Error::decode(type_name, format!("invalid base64 data: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

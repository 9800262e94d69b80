//! `browsingContext` module: navigables, navigation, screenshots, prompts.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::codec::wire_enum;
use crate::identifiers::{BrowsingContextId, ClientWindowId, NavigationId, UserContextId};

use super::script::{RemoteValue, SerializationOptions, SharedReference};
use super::session::UserPromptHandlerType;

// ============================================================================
// Enums
// ============================================================================

wire_enum! {
    /// How far a navigation must progress before its command returns.
    pub enum ReadinessState {
        /// Return as soon as navigation starts.
        None => "none",
        /// Wait for `DOMContentLoaded`.
        Interactive => "interactive",
        /// Wait for `load`.
        Complete => "complete",
    }
}

wire_enum! {
    /// Kind of user prompt.
    pub enum UserPromptType {
        /// `alert()`.
        Alert => "alert",
        /// `beforeunload` confirmation.
        BeforeUnload => "beforeunload",
        /// `confirm()`.
        Confirm => "confirm",
        /// `prompt()`.
        Prompt => "prompt",
    }
}

wire_enum! {
    /// Kind of top-level context to create.
    pub enum CreateType {
        /// New tab.
        Tab => "tab",
        /// New window.
        Window => "window",
    }
}

wire_enum! {
    /// Coordinate space of a screenshot.
    pub enum ScreenshotOrigin {
        /// Visible viewport.
        Viewport => "viewport",
        /// Whole document.
        Document => "document",
    }
}

wire_enum! {
    /// Page orientation for printing.
    pub enum PrintOrientation {
        /// Portrait.
        Portrait => "portrait",
        /// Landscape.
        Landscape => "landscape",
    }
}

wire_enum! {
    /// Inner text locator match mode.
    pub enum InnerTextMatchType {
        /// Whole text must match.
        Full => "full",
        /// Substring match.
        Partial => "partial",
    }
}

// ============================================================================
// Info
// ============================================================================

/// One node in the browsing context tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// Context id.
    pub context: BrowsingContextId,
    /// Current URL.
    pub url: String,
    /// Child contexts; `None` when beyond the requested depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Info>>,
    /// Parent context, for frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<BrowsingContextId>,
    /// Owning user context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContextId>,
    /// OS window holding the context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_window: Option<ClientWindowId>,
    /// Context that opened this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_opener: Option<BrowsingContextId>,
}

impl Info {
    /// Iterates over this context and all descendants, depth first.
    pub fn walk(&self) -> impl Iterator<Item = &Info> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            if let Some(children) = &next.children {
                stack.extend(children.iter().rev());
            }
            Some(next)
        })
    }
}

// ============================================================================
// Locator
// ============================================================================

/// Accessibility locator criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityLocatorValue {
    /// Accessible name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ARIA role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Context locator criteria (finds the container element of a frame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLocatorValue {
    /// Frame context.
    pub context: BrowsingContextId,
}

/// How `browsingContext.locateNodes` finds nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Locator {
    /// By accessible name or role.
    Accessibility {
        /// Criteria.
        value: AccessibilityLocatorValue,
    },
    /// CSS selector.
    Css {
        /// Selector.
        value: String,
    },
    /// Frame container element.
    Context {
        /// Criteria.
        value: ContextLocatorValue,
    },
    /// Rendered text.
    InnerText {
        /// Text to match.
        value: String,
        /// Case-insensitive match.
        #[serde(skip_serializing_if = "Option::is_none")]
        ignore_case: Option<bool>,
        /// Full or partial match.
        #[serde(skip_serializing_if = "Option::is_none")]
        match_type: Option<InnerTextMatchType>,
        /// Maximum depth of matched elements.
        #[serde(skip_serializing_if = "Option::is_none")]
        max_depth: Option<u64>,
    },
    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath {
        /// Expression.
        value: String,
    },
}

impl Locator {
    /// CSS selector locator.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            value: selector.into(),
        }
    }

    /// XPath locator.
    #[inline]
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath {
            value: expression.into(),
        }
    }

    /// Full inner text locator.
    #[inline]
    #[must_use]
    pub fn inner_text(text: impl Into<String>) -> Self {
        Self::InnerText {
            value: text.into(),
            ignore_case: None,
            match_type: None,
            max_depth: None,
        }
    }
}

// ============================================================================
// Screenshot & Print Types
// ============================================================================

/// Region of a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipRectangle {
    /// Rectangle in CSS pixels.
    Box {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Bounding box of an element.
    Element {
        /// Element to clip to.
        element: SharedReference,
    },
}

/// Screenshot image encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFormat {
    /// MIME type, e.g. `image/png`.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Lossy quality in `0.0..=1.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

/// Print margins in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintMargin {
    /// Bottom margin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<f64>,
    /// Left margin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    /// Right margin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<f64>,
    /// Top margin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

/// Print page size in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintPage {
    /// Page height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Page width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Page range entry: a page number or a `"2-5"` style string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageRange {
    /// Single page.
    Page(u64),
    /// Range expression.
    Range(String),
}

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

// ============================================================================
// Commands
// ============================================================================

/// `browsingContext.activate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activate {
    /// Top-level context to focus.
    pub context: BrowsingContextId,
}

/// `browsingContext.captureScreenshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureScreenshot {
    /// Context to capture.
    pub context: BrowsingContextId,
    /// Coordinate space.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<ScreenshotOrigin>,
    /// Encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    /// Clip region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipRectangle>,
}

impl CaptureScreenshot {
    /// Captures the viewport as PNG.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId) -> Self {
        Self {
            context,
            origin: None,
            format: None,
            clip: None,
        }
    }
}

/// Result of `browsingContext.captureScreenshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureScreenshotResult {
    /// Base64-encoded image.
    pub data: String,
}

/// `browsingContext.close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Close {
    /// Top-level context to close.
    pub context: BrowsingContextId,
    /// Run `beforeunload` handlers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_unload: Option<bool>,
}

/// `browsingContext.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Create {
    /// Tab or window.
    #[serde(rename = "type")]
    pub kind: CreateType,
    /// Open next to this context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_context: Option<BrowsingContextId>,
    /// Do not focus the new context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    /// User context to open in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContextId>,
}

impl Create {
    /// Creates a context of the given kind with defaults.
    #[inline]
    #[must_use]
    pub fn new(kind: CreateType) -> Self {
        Self {
            kind,
            reference_context: None,
            background: None,
            user_context: None,
        }
    }
}

/// Result of `browsingContext.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    /// New context id.
    pub context: BrowsingContextId,
    /// User context it was opened in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContextId>,
}

/// `browsingContext.getTree`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTree {
    /// Depth limit; unlimited when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u64>,
    /// Subtree root; all top-level contexts when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<BrowsingContextId>,
}

/// Result of `browsingContext.getTree`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTreeResult {
    /// Roots of the returned tree.
    pub contexts: Vec<Info>,
}

/// `browsingContext.handleUserPrompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleUserPrompt {
    /// Context showing the prompt.
    pub context: BrowsingContextId,
    /// Accept or dismiss.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<bool>,
    /// Text for `prompt()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
}

/// `browsingContext.locateNodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateNodes {
    /// Context to search.
    pub context: BrowsingContextId,
    /// Search criteria.
    pub locator: Locator,
    /// Maximum nodes returned; at least 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<u64>,
    /// Node serialization limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Search roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_nodes: Option<Vec<SharedReference>>,
}

impl LocateNodes {
    /// Locates every match in a context.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId, locator: Locator) -> Self {
        Self {
            context,
            locator,
            max_node_count: None,
            serialization_options: None,
            start_nodes: None,
        }
    }
}

/// Result of `browsingContext.locateNodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateNodesResult {
    /// Matched nodes.
    pub nodes: Vec<RemoteValue>,
}

/// `browsingContext.navigate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigate {
    /// Context to navigate.
    pub context: BrowsingContextId,
    /// Absolute URL.
    pub url: String,
    /// Readiness to wait for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<ReadinessState>,
}

/// Result of `browsingContext.navigate` and `browsingContext.reload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateResult {
    /// Navigation id; absent for same-document navigations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationId>,
    /// Final URL.
    pub url: String,
}

/// `browsingContext.print`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Print {
    /// Context to print.
    pub context: BrowsingContextId,
    /// Print backgrounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    /// Margins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<PrintMargin>,
    /// Orientation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<PrintOrientation>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PrintPage>,
    /// Pages to print.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ranges: Option<Vec<PageRange>>,
    /// Scale in `0.1..=2.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Shrink content to page width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shrink_to_fit: Option<bool>,
}

impl Print {
    /// Prints a context with defaults.
    #[inline]
    #[must_use]
    pub fn new(context: BrowsingContextId) -> Self {
        Self {
            context,
            background: None,
            margin: None,
            orientation: None,
            page: None,
            page_ranges: None,
            scale: None,
            shrink_to_fit: None,
        }
    }
}

/// Result of `browsingContext.print`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintResult {
    /// Base64-encoded PDF.
    pub data: String,
}

/// `browsingContext.reload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reload {
    /// Context to reload.
    pub context: BrowsingContextId,
    /// Bypass the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_cache: Option<bool>,
    /// Readiness to wait for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<ReadinessState>,
}

/// `browsingContext.setViewport`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetViewport {
    /// Top-level context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
    /// New viewport; the remote end's default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    /// Device pixel ratio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_pixel_ratio: Option<f64>,
    /// Apply to these user contexts instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
}

/// `browsingContext.traverseHistory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraverseHistory {
    /// Top-level context.
    pub context: BrowsingContextId,
    /// Steps; negative goes back.
    pub delta: i64,
}

// ============================================================================
// Events
// ============================================================================

/// Payload shared by navigation events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationInfo {
    /// Navigated context.
    pub context: BrowsingContextId,
    /// Navigation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationId>,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Target URL.
    pub url: String,
}

/// `browsingContext.downloadWillBegin` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadWillBegin {
    /// Navigation fields.
    #[serde(flatten)]
    pub navigation: NavigationInfo,
    /// File name suggested by the page.
    pub suggested_filename: String,
}

/// `browsingContext.historyUpdated` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryUpdated {
    /// Context whose history changed.
    pub context: BrowsingContextId,
    /// New URL.
    pub url: String,
    /// Milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// `browsingContext.userPromptOpened` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptOpened {
    /// Context showing the prompt.
    pub context: BrowsingContextId,
    /// Handler the remote end will apply.
    pub handler: UserPromptHandlerType,
    /// Prompt message.
    pub message: String,
    /// Prompt kind.
    #[serde(rename = "type")]
    pub kind: UserPromptType,
    /// Default text of `prompt()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// `browsingContext.userPromptClosed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptClosed {
    /// Context that showed the prompt.
    pub context: BrowsingContextId,
    /// Whether the prompt was accepted.
    pub accepted: bool,
    /// Prompt kind.
    #[serde(rename = "type")]
    pub kind: UserPromptType,
    /// Text entered into `prompt()`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::testing::{assert_round_trip, assert_unknown_variant};

    #[test]
    fn test_navigate_omits_absent_wait() {
        let params = Navigate {
            context: BrowsingContextId::new("ctx"),
            url: "https://example.com/".to_string(),
            wait: None,
        };
        assert_eq!(
            serde_json::to_value(&params).expect("encode"),
            json!({ "context": "ctx", "url": "https://example.com/" })
        );
    }

    #[test]
    fn test_info_tree_decodes_null_children() {
        let info: Info = serde_json::from_value(json!({
            "context": "top",
            "url": "about:blank",
            "children": [
                { "context": "frame", "url": "about:blank", "children": null, "parent": "top" }
            ],
            "originalOpener": null,
            "userContext": "default"
        }))
        .expect("decode");

        let ids: Vec<_> = info.walk().map(|i| i.context.as_str()).collect();
        assert_eq!(ids, ["top", "frame"]);
        assert_eq!(info.original_opener, None);
    }

    #[test]
    fn test_locator_wire_tags() {
        assert_eq!(
            serde_json::to_value(Locator::css("a")).expect("encode"),
            json!({ "type": "css", "value": "a" })
        );
        assert_eq!(
            serde_json::to_value(Locator::xpath("//a")).expect("encode"),
            json!({ "type": "xpath", "value": "//a" })
        );
        assert_eq!(
            serde_json::to_value(Locator::InnerText {
                value: "Go".into(),
                ignore_case: Some(true),
                match_type: Some(InnerTextMatchType::Partial),
                max_depth: None,
            })
            .expect("encode"),
            json!({ "type": "innerText", "value": "Go", "ignoreCase": true, "matchType": "partial" })
        );
    }

    #[test]
    fn test_download_will_begin_is_lifted() {
        let event: DownloadWillBegin = serde_json::from_value(json!({
            "context": "ctx",
            "navigation": "nav-1",
            "timestamp": 5,
            "url": "https://example.com/file.zip",
            "suggestedFilename": "file.zip"
        }))
        .expect("decode");

        assert_eq!(event.navigation.url, "https://example.com/file.zip");
        assert_eq!(event.suggested_filename, "file.zip");
    }

    #[test]
    fn test_clip_rectangle_box() {
        let clip = ClipRectangle::Box {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 20.0,
        };
        assert_eq!(
            serde_json::to_value(clip).expect("encode"),
            json!({ "type": "box", "x": 0.0, "y": 0.0, "width": 10.0, "height": 20.0 })
        );
    }

    #[test]
    fn test_locator_round_trips() {
        for locator in [
            Locator::css("main > a"),
            Locator::XPath {
                value: "//button".into(),
            },
            Locator::Accessibility {
                value: AccessibilityLocatorValue {
                    name: Some("Submit".into()),
                    role: None,
                },
            },
            Locator::Context {
                value: ContextLocatorValue {
                    context: BrowsingContextId::new("frame-1"),
                },
            },
            Locator::InnerText {
                value: "Sign in".into(),
                ignore_case: Some(true),
                match_type: Some(InnerTextMatchType::Partial),
                max_depth: Some(3),
            },
        ] {
            assert_round_trip(&locator);
        }
    }

    #[test]
    fn test_unknown_locator_type_is_rejected() {
        assert_unknown_variant::<Locator>(json!({ "type": "id", "value": "x" }), "id");
    }
}

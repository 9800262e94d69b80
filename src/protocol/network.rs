//! `network` module: request observation and interception.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::codec::wire_enum;
use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, InterceptId, NavigationId, RequestId};

use super::script::StackTrace;

// ============================================================================
// Enums
// ============================================================================

wire_enum! {
    /// Cookie `SameSite` attribute.
    pub enum SameSite {
        /// Strict.
        Strict => "strict",
        /// Lax.
        Lax => "lax",
        /// None.
        None => "none",
        /// Browser default.
        Default => "default",
    }
}

wire_enum! {
    /// Point in a request's lifecycle where an intercept blocks it.
    pub enum InterceptPhase {
        /// Before the request is sent.
        BeforeRequestSent => "beforeRequestSent",
        /// After response headers arrive.
        ResponseStarted => "responseStarted",
        /// When the server asks for credentials.
        AuthRequired => "authRequired",
    }
}

wire_enum! {
    /// Network cache mode.
    pub enum CacheBehavior {
        /// Normal caching.
        Default => "default",
        /// Bypass the cache.
        Bypass => "bypass",
    }
}

wire_enum! {
    /// What started a request.
    pub enum InitiatorType {
        /// HTML parser.
        Parser => "parser",
        /// Script.
        Script => "script",
        /// CORS preflight.
        Preflight => "preflight",
        /// Anything else.
        Other => "other",
    }
}

// ============================================================================
// BytesValue
// ============================================================================

/// Header, cookie or body bytes: UTF-8 text or base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BytesValue {
    /// UTF-8 text.
    String {
        /// Text.
        value: String,
    },
    /// Arbitrary bytes.
    Base64 {
        /// Base64 text.
        value: String,
    },
}

impl BytesValue {
    /// Text value.
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    /// Binary value, base64-encoded.
    #[inline]
    #[must_use]
    pub fn bytes(value: &[u8]) -> Self {
        Self::Base64 {
            value: STANDARD.encode(value),
        }
    }

    /// Returns the text, if this is a string value.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String { value } => Some(value),
            Self::Base64 { .. } => None,
        }
    }

    /// Returns the raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a base64 value is malformed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::String { value } => Ok(value.as_bytes().to_vec()),
            Self::Base64 { value } => STANDARD
                .decode(value)
                .map_err(|e| Error::decode("BytesValue", e.to_string())),
        }
    }
}

// ============================================================================
// Shared Types
// ============================================================================

/// A cookie as reported by the remote end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    pub domain: String,
    /// Path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// `HttpOnly`.
    pub http_only: bool,
    /// `Secure`.
    pub secure: bool,
    /// `SameSite`.
    pub same_site: SameSite,
    /// Expiry in seconds since the epoch; session cookie when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// A cookie sent with a continued request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieHeader {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
}

/// An HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
}

impl Header {
    /// Creates a text header.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::text(value),
        }
    }
}

/// `Set-Cookie` header for a provided or continued response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCookieHeader {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// `HttpOnly`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Expires` date string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    /// `Max-Age` seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `SameSite`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

/// Resource timing, in milliseconds relative to `time_origin`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchTimingInfo {
    /// Time origin.
    pub time_origin: f64,
    /// Request creation.
    pub request_time: f64,
    /// Redirect start.
    pub redirect_start: f64,
    /// Redirect end.
    pub redirect_end: f64,
    /// Fetch start.
    pub fetch_start: f64,
    /// DNS lookup start.
    pub dns_start: f64,
    /// DNS lookup end.
    pub dns_end: f64,
    /// Connection start.
    pub connect_start: f64,
    /// Connection end.
    pub connect_end: f64,
    /// TLS handshake start.
    pub tls_start: f64,
    /// Request sent.
    pub request_start: f64,
    /// First response byte.
    pub response_start: f64,
    /// Last response byte.
    pub response_end: f64,
}

/// Request details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    /// Request id, stable across redirects.
    pub request: RequestId,
    /// URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Cookies.
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    /// Header bytes.
    #[serde(default)]
    pub headers_size: u64,
    /// Body bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<u64>,
    /// Fetch destination (`document`, `script`, ...).
    #[serde(default)]
    pub destination: String,
    /// Initiator type string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator_type: Option<String>,
    /// Timing.
    #[serde(default)]
    pub timings: FetchTimingInfo,
}

/// Who started a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiator {
    /// Script column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u64>,
    /// Script line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
    /// Request that caused this one (preflight).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestId>,
    /// Script stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
    /// Initiator kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<InitiatorType>,
}

/// Response body size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContent {
    /// Decoded body bytes.
    pub size: u64,
}

/// `WWW-Authenticate` challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    /// Scheme.
    pub scheme: String,
    /// Realm.
    pub realm: String,
}

/// Response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    /// Final URL.
    pub url: String,
    /// Protocol (`http/1.1`, `h2`, ...).
    pub protocol: String,
    /// Status code.
    pub status: u16,
    /// Status text.
    pub status_text: String,
    /// Served from cache.
    pub from_cache: bool,
    /// Headers.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// MIME type.
    pub mime_type: String,
    /// Bytes received on the wire.
    pub bytes_received: u64,
    /// Header bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers_size: Option<u64>,
    /// Body bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_size: Option<u64>,
    /// Content details.
    #[serde(default)]
    pub content: ResponseContent,
    /// Authentication challenges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_challenges: Option<Vec<AuthChallenge>>,
}

/// URL filter for an intercept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UrlPattern {
    /// URL pattern string.
    String {
        /// Pattern.
        pattern: String,
    },
    /// Component-wise pattern.
    Pattern {
        /// Scheme.
        #[serde(skip_serializing_if = "Option::is_none")]
        protocol: Option<String>,
        /// Host.
        #[serde(skip_serializing_if = "Option::is_none")]
        hostname: Option<String>,
        /// Port.
        #[serde(skip_serializing_if = "Option::is_none")]
        port: Option<String>,
        /// Path.
        #[serde(skip_serializing_if = "Option::is_none")]
        pathname: Option<String>,
        /// Query.
        #[serde(skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    },
}

/// Credentials for an auth challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthCredentials {
    /// Username and password.
    Password {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
}

/// How to answer an auth challenge, spliced onto `network.continueWithAuth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AuthAction {
    /// Answer with credentials.
    ProvideCredentials {
        /// Credentials.
        credentials: AuthCredentials,
    },
    /// Let the browser handle it.
    Default,
    /// Cancel the request.
    Cancel,
}

// ============================================================================
// Commands
// ============================================================================

/// `network.addIntercept`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddIntercept {
    /// Phases to block at; at least one.
    pub phases: Vec<InterceptPhase>,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
    /// Restrict to matching URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_patterns: Option<Vec<UrlPattern>>,
}

/// Result of `network.addIntercept`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddInterceptResult {
    /// New intercept id.
    pub intercept: InterceptId,
}

/// `network.continueRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueRequest {
    /// Blocked request.
    pub request: RequestId,
    /// Replacement body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BytesValue>,
    /// Replacement cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<CookieHeader>>,
    /// Replacement headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Replacement method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Replacement URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ContinueRequest {
    /// Continues a request unchanged.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            body: None,
            cookies: None,
            headers: None,
            method: None,
            url: None,
        }
    }
}

/// `network.continueResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueResponse {
    /// Blocked request.
    pub request: RequestId,
    /// Replacement `Set-Cookie` headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<SetCookieHeader>>,
    /// Credentials for an auth challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<AuthCredentials>,
    /// Replacement headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Replacement status text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_phrase: Option<String>,
    /// Replacement status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ContinueResponse {
    /// Continues a response unchanged.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            cookies: None,
            credentials: None,
            headers: None,
            reason_phrase: None,
            status_code: None,
        }
    }
}

/// `network.continueWithAuth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinueWithAuth {
    /// Request blocked at `authRequired`.
    pub request: RequestId,
    /// Answer.
    #[serde(flatten)]
    pub action: AuthAction,
}

/// `network.failRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailRequest {
    /// Blocked request.
    pub request: RequestId,
}

/// `network.provideResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvideResponse {
    /// Blocked request.
    pub request: RequestId,
    /// Body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BytesValue>,
    /// `Set-Cookie` headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<SetCookieHeader>>,
    /// Headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    /// Status text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_phrase: Option<String>,
    /// Status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ProvideResponse {
    /// Creates an empty provided response.
    #[inline]
    #[must_use]
    pub fn new(request: RequestId) -> Self {
        Self {
            request,
            body: None,
            cookies: None,
            headers: None,
            reason_phrase: None,
            status_code: None,
        }
    }
}

/// `network.removeIntercept`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveIntercept {
    /// Intercept to remove.
    pub intercept: InterceptId,
}

/// `network.setCacheBehavior`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCacheBehavior {
    /// Cache mode.
    pub cache_behavior: CacheBehavior,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
}

// ============================================================================
// Events
// ============================================================================

/// Fields common to every network event, spliced onto each payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseParameters {
    /// Context the request belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
    /// Request is blocked by an intercept.
    pub is_blocked: bool,
    /// Navigation the request belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationId>,
    /// Redirects so far.
    pub redirect_count: u64,
    /// Request details.
    pub request: RequestData,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    /// Intercepts blocking the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intercepts: Option<Vec<InterceptId>>,
}

/// `network.beforeRequestSent` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeRequestSent {
    /// Common fields.
    #[serde(flatten)]
    pub base: BaseParameters,
    /// Initiator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<Initiator>,
}

/// `network.responseStarted` and `network.responseCompleted` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Common fields.
    #[serde(flatten)]
    pub base: BaseParameters,
    /// Response details.
    pub response: ResponseData,
}

/// `network.fetchError` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchError {
    /// Common fields.
    #[serde(flatten)]
    pub base: BaseParameters,
    /// Error description.
    pub error_text: String,
}

/// `network.authRequired` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthRequired {
    /// Common fields.
    #[serde(flatten)]
    pub base: BaseParameters,
    /// Response carrying the challenge.
    pub response: ResponseData,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::testing::{assert_round_trip, assert_unknown_variant};

    fn request_json() -> serde_json::Value {
        json!({
            "request": "r-1",
            "url": "https://example.com/",
            "method": "GET",
            "headers": [{ "name": "accept", "value": { "type": "string", "value": "*/*" } }],
            "cookies": [],
            "headersSize": 20,
            "bodySize": null,
            "destination": "document",
            "initiatorType": null,
            "timings": { "timeOrigin": 0, "requestTime": 1.5 }
        })
    }

    #[test]
    fn test_before_request_sent_is_lifted() {
        let event: BeforeRequestSent = serde_json::from_value(json!({
            "context": "ctx",
            "isBlocked": true,
            "navigation": null,
            "redirectCount": 0,
            "request": request_json(),
            "timestamp": 100,
            "intercepts": ["i-1"],
            "initiator": { "type": "parser" }
        }))
        .expect("decode");

        assert!(event.base.is_blocked);
        assert_eq!(event.base.request.request.as_str(), "r-1");
        assert_eq!(event.base.request.headers[0].value.as_text(), Some("*/*"));
        assert_eq!(
            event.initiator.and_then(|i| i.kind),
            Some(InitiatorType::Parser)
        );
    }

    #[test]
    fn test_continue_with_auth_splices_action() {
        let params = ContinueWithAuth {
            request: RequestId::new("r-1"),
            action: AuthAction::ProvideCredentials {
                credentials: AuthCredentials::Password {
                    username: "u".into(),
                    password: "p".into(),
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&params).expect("encode"),
            json!({
                "request": "r-1",
                "action": "provideCredentials",
                "credentials": { "type": "password", "username": "u", "password": "p" }
            })
        );

        let cancel = ContinueWithAuth {
            request: RequestId::new("r-1"),
            action: AuthAction::Cancel,
        };
        assert_eq!(
            serde_json::to_value(&cancel).expect("encode"),
            json!({ "request": "r-1", "action": "cancel" })
        );
    }

    #[test]
    fn test_bytes_value_base64() {
        let value = BytesValue::bytes(&[0xde, 0xad]);
        assert_eq!(
            serde_json::to_value(&value).expect("encode"),
            json!({ "type": "base64", "value": "3q0=" })
        );
        assert_eq!(value.to_bytes().expect("bytes"), vec![0xde, 0xad]);
        assert_eq!(value.as_text(), None);
    }

    #[test]
    fn test_bytes_value_rejects_bad_base64() {
        let value = BytesValue::Base64 {
            value: "***".into(),
        };
        assert!(matches!(value.to_bytes(), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_url_pattern_forms() {
        let pattern = UrlPattern::Pattern {
            protocol: None,
            hostname: Some("example.com".into()),
            port: None,
            pathname: None,
            search: None,
        };
        assert_eq!(
            serde_json::to_value(&pattern).expect("encode"),
            json!({ "type": "pattern", "hostname": "example.com" })
        );
    }

    #[test]
    fn test_auth_action_round_trips() {
        for action in [
            AuthAction::ProvideCredentials {
                credentials: AuthCredentials::Password {
                    username: "user".into(),
                    password: "secret".into(),
                },
            },
            AuthAction::Default,
            AuthAction::Cancel,
        ] {
            assert_round_trip(&action);
            assert_round_trip(&ContinueWithAuth {
                request: RequestId::new("r-1"),
                action,
            });
        }
    }

    #[test]
    fn test_unknown_auth_action_is_rejected() {
        assert_unknown_variant::<AuthAction>(json!({ "action": "retry" }), "retry");
    }
}

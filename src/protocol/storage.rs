//! `storage` module: cookies by storage partition.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{BrowsingContextId, UserContextId};

use super::network::{BytesValue, Cookie, SameSite};

// ============================================================================
// Partitions
// ============================================================================

/// Which storage partition a command operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PartitionDescriptor {
    /// Partition of a browsing context.
    Context {
        /// Context.
        context: BrowsingContextId,
    },
    /// Partition identified by key attributes.
    StorageKey {
        /// User context.
        #[serde(skip_serializing_if = "Option::is_none")]
        user_context: Option<UserContextId>,
        /// Source origin.
        #[serde(skip_serializing_if = "Option::is_none")]
        source_origin: Option<String>,
    },
}

/// Partition key the remote end resolved a command to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKey {
    /// User context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContextId>,
    /// Source origin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_origin: Option<String>,
}

// ============================================================================
// Cookies
// ============================================================================

/// Cookie match criteria; every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieFilter {
    /// Name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<BytesValue>,
    /// Domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// `HttpOnly`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `SameSite`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl CookieFilter {
    /// Matches cookies by name.
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Cookie to set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialCookie {
    /// Name.
    pub name: String,
    /// Value.
    pub value: BytesValue,
    /// Domain.
    pub domain: String,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `HttpOnly`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Secure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// `SameSite`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Expiry in seconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl PartialCookie {
    /// Creates a text cookie for a domain.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BytesValue::text(value),
            domain: domain.into(),
            path: None,
            http_only: None,
            secure: None,
            same_site: None,
            expiry: None,
        }
    }

    /// Sets the path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets `Secure`.
    #[inline]
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets `HttpOnly`.
    #[inline]
    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    /// Sets `SameSite`.
    #[inline]
    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Sets the expiry.
    #[inline]
    #[must_use]
    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

// ============================================================================
// Commands
// ============================================================================

/// `storage.getCookies`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCookies {
    /// Match criteria.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CookieFilter>,
    /// Partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionDescriptor>,
}

/// Result of `storage.getCookies`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCookiesResult {
    /// Matching cookies.
    pub cookies: Vec<Cookie>,
    /// Resolved partition.
    #[serde(default)]
    pub partition_key: PartitionKey,
}

/// `storage.setCookie`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCookie {
    /// Cookie.
    pub cookie: PartialCookie,
    /// Partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionDescriptor>,
}

/// `storage.deleteCookies`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCookies {
    /// Match criteria; every cookie when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<CookieFilter>,
    /// Partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionDescriptor>,
}

/// Result of `storage.setCookie` and `storage.deleteCookies`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKeyResult {
    /// Resolved partition.
    #[serde(default)]
    pub partition_key: PartitionKey,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_storage_key_descriptor_wire_form() {
        let descriptor = PartitionDescriptor::StorageKey {
            user_context: Some(UserContextId::new("default")),
            source_origin: None,
        };
        assert_eq!(
            serde_json::to_value(&descriptor).expect("encode"),
            json!({ "type": "storageKey", "userContext": "default" })
        );
    }

    #[test]
    fn test_set_cookie_params() {
        let params = SetCookie {
            cookie: PartialCookie::new("sid", "abc", "example.com")
                .with_path("/")
                .with_same_site(SameSite::Lax),
            partition: None,
        };
        assert_eq!(
            serde_json::to_value(&params).expect("encode"),
            json!({
                "cookie": {
                    "name": "sid",
                    "value": { "type": "string", "value": "abc" },
                    "domain": "example.com",
                    "path": "/",
                    "sameSite": "lax"
                }
            })
        );
    }

    #[test]
    fn test_get_cookies_result() {
        let result: GetCookiesResult = serde_json::from_value(json!({
            "cookies": [{
                "name": "sid",
                "value": { "type": "string", "value": "abc" },
                "domain": "example.com",
                "path": "/",
                "size": 6,
                "httpOnly": false,
                "secure": true,
                "sameSite": "none"
            }],
            "partitionKey": { "sourceOrigin": "https://example.com" }
        }))
        .expect("decode");

        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies[0].same_site, SameSite::None);
        assert_eq!(
            result.partition_key.source_origin.as_deref(),
            Some("https://example.com")
        );
    }
}

//! `storage` commands: cookies by partition.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::network::Cookie;
use crate::protocol::storage::{
    CookieFilter, DeleteCookies, GetCookies, GetCookiesResult, PartialCookie, PartitionDescriptor,
    PartitionKey, SetCookie,
};
use crate::session::Session;

use super::require_non_empty;

// ============================================================================
// StorageManager
// ============================================================================

/// Commands of the `storage` module.
#[derive(Debug, Clone)]
pub struct StorageManager {
    session: Session,
}

impl StorageManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Lists cookies matching `filter` in a partition.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_cookies(
        &self,
        filter: Option<CookieFilter>,
        partition: Option<PartitionDescriptor>,
    ) -> Result<GetCookiesResult> {
        self.session.send(GetCookies { filter, partition }).await
    }

    /// Returns the first cookie named `name` in the default partition.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_cookie(&self, name: &str) -> Result<Option<Cookie>> {
        let result = self
            .get_cookies(Some(CookieFilter::named(name)), None)
            .await?;
        Ok(result.cookies.into_iter().next())
    }

    /// Sets a cookie.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty name or domain
    /// - session and protocol errors
    pub async fn set_cookie(
        &self,
        cookie: PartialCookie,
        partition: Option<PartitionDescriptor>,
    ) -> Result<PartitionKey> {
        require_non_empty("cookie name", &cookie.name)?;
        require_non_empty("cookie domain", &cookie.domain)?;
        if cookie.name.contains(['=', ';']) {
            return Err(Error::invalid_argument(format!(
                "cookie name {:?} contains a separator",
                cookie.name
            )));
        }

        debug!(name = %cookie.name, domain = %cookie.domain, "Setting cookie");
        Ok(self
            .session
            .send(SetCookie { cookie, partition })
            .await?
            .partition_key)
    }

    /// Deletes cookies matching `filter`; every cookie when `None`.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn delete_cookies(
        &self,
        filter: Option<CookieFilter>,
        partition: Option<PartitionDescriptor>,
    ) -> Result<PartitionKey> {
        Ok(self
            .session
            .send(DeleteCookies { filter, partition })
            .await?
            .partition_key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::identifiers::BrowsingContextId;
    use crate::testing::{MockRemote, active_session};
    use crate::transport::ConnectionOptions;

    #[tokio::test]
    async fn test_cookie_validation() {
        let storage = StorageManager::new(Session::new(ConnectionOptions::default()));

        for cookie in [
            PartialCookie::new("", "v", "example.com"),
            PartialCookie::new("a", "v", ""),
            PartialCookie::new("a=b", "v", "example.com"),
        ] {
            let err = storage.set_cookie(cookie, None).await;
            assert!(matches!(err, Err(Error::InvalidArgument { .. })));
        }
    }

    #[tokio::test]
    async fn test_set_cookie_in_context_partition() {
        let mut remote = MockRemote::start().await;
        let storage = StorageManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let storage = storage.clone();
            async move {
                let cookie = PartialCookie::new("token", "abc", "example.com").with_secure(true);
                let partition = PartitionDescriptor::Context {
                    context: BrowsingContextId::new("ctx"),
                };
                storage.set_cookie(cookie, Some(partition)).await
            }
        });

        let command = remote
            .reply(
                "storage.setCookie",
                json!({ "partitionKey": { "userContext": "default" } }),
            )
            .await;
        assert_eq!(
            command["params"],
            json!({
                "cookie": {
                    "name": "token",
                    "value": { "type": "string", "value": "abc" },
                    "domain": "example.com",
                    "secure": true
                },
                "partition": { "type": "context", "context": "ctx" }
            })
        );

        let key = assert_ok!(task.await.expect("join"));
        assert_eq!(key.user_context.as_ref().map(|u| u.as_str()), Some("default"));
    }

    #[tokio::test]
    async fn test_get_cookie_by_name() {
        let mut remote = MockRemote::start().await;
        let storage = StorageManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let storage = storage.clone();
            async move { storage.get_cookie("sid").await }
        });

        let command = remote
            .reply(
                "storage.getCookies",
                json!({
                    "cookies": [{
                        "name": "sid",
                        "value": { "type": "string", "value": "42" },
                        "domain": "example.com",
                        "path": "/",
                        "size": 5,
                        "httpOnly": true,
                        "secure": false,
                        "sameSite": "lax"
                    }],
                    "partitionKey": {}
                }),
            )
            .await;
        assert_eq!(command["params"], json!({ "filter": { "name": "sid" } }));

        let cookie = assert_ok!(task.await.expect("join")).expect("cookie");
        assert_eq!(cookie.value.as_text(), Some("42"));
        assert!(cookie.http_only);
    }

    #[tokio::test]
    async fn test_delete_all_cookies_sends_empty_params() {
        let mut remote = MockRemote::start().await;
        let storage = StorageManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let storage = storage.clone();
            async move { storage.delete_cookies(None, None).await }
        });

        let command = remote
            .reply("storage.deleteCookies", json!({ "partitionKey": {} }))
            .await;
        assert_eq!(command["params"], json!({}));
        assert_ok!(task.await.expect("join"));
    }
}

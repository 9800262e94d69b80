//! `network` commands: intercepts and blocked request control.
//!
//! A request matched by an intercept is blocked at one phase until it is
//! continued, failed or answered. The blocking event carries the
//! [`RequestId`] to answer with.

// ============================================================================
// Imports
// ============================================================================

use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, InterceptId, RequestId};
use crate::protocol::BidiEvent;
use crate::protocol::network::{
    AddIntercept, AuthAction, AuthCredentials, BeforeRequestSent, CacheBehavior, ContinueRequest,
    ContinueResponse, ContinueWithAuth, FailRequest, Header, InterceptPhase, ProvideResponse,
    RemoveIntercept, SetCacheBehavior, UrlPattern,
};
use crate::session::Session;
use crate::transport::ListenerId;

use super::{require_items, require_non_empty, require_url};

// ============================================================================
// NetworkManager
// ============================================================================

/// Commands of the `network` module.
#[derive(Debug, Clone)]
pub struct NetworkManager {
    session: Session,
}

impl NetworkManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Blocks matching requests at the given phases.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for no phases, an empty context or
    ///   pattern list, or a malformed pattern
    /// - session and protocol errors
    pub async fn add_intercept(
        &self,
        phases: Vec<InterceptPhase>,
        contexts: Option<Vec<BrowsingContextId>>,
        url_patterns: Option<Vec<UrlPattern>>,
    ) -> Result<InterceptId> {
        require_items("intercept phases", &phases)?;
        if let Some(contexts) = &contexts {
            require_items("intercept contexts", contexts)?;
        }
        if let Some(patterns) = &url_patterns {
            require_items("URL patterns", patterns)?;
            patterns.iter().try_for_each(validate_pattern)?;
        }

        let result = self
            .session
            .send(AddIntercept {
                phases,
                contexts,
                url_patterns,
            })
            .await?;

        debug!(intercept = %result.intercept, "Intercept added");
        Ok(result.intercept)
    }

    /// Removes an intercept.
    ///
    /// # Errors
    ///
    /// Session and protocol errors (`no such intercept` if unknown).
    pub async fn remove_intercept(&self, intercept: &InterceptId) -> Result<()> {
        self.session
            .send(RemoveIntercept {
                intercept: intercept.clone(),
            })
            .await?;
        debug!(%intercept, "Intercept removed");
        Ok(())
    }

    /// Resumes a request blocked before sending, optionally modified.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a malformed URL, an empty method or
    ///   an empty header name
    /// - session and protocol errors
    pub async fn continue_request(&self, params: ContinueRequest) -> Result<()> {
        if let Some(url) = &params.url {
            require_url("request URL", url)?;
        }
        if let Some(method) = &params.method {
            validate_method(method)?;
        }
        validate_headers(params.headers.as_deref())?;

        self.session.send(params).await?;
        Ok(())
    }

    /// Resumes a request blocked after response headers, optionally modified.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a status code outside `100..=599` or
    ///   an empty header name
    /// - session and protocol errors
    pub async fn continue_response(&self, params: ContinueResponse) -> Result<()> {
        validate_status(params.status_code)?;
        validate_headers(params.headers.as_deref())?;

        self.session.send(params).await?;
        Ok(())
    }

    /// Answers an auth challenge.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty username
    /// - session and protocol errors
    pub async fn continue_with_auth(&self, request: &RequestId, action: AuthAction) -> Result<()> {
        if let AuthAction::ProvideCredentials {
            credentials: AuthCredentials::Password { username, .. },
        } = &action
        {
            require_non_empty("username", username)?;
        }

        self.session
            .send(ContinueWithAuth {
                request: request.clone(),
                action,
            })
            .await?;
        Ok(())
    }

    /// Fails a blocked request with a network error.
    ///
    /// # Errors
    ///
    /// Session and protocol errors (`no such request` if not blocked).
    pub async fn fail_request(&self, request: &RequestId) -> Result<()> {
        self.session
            .send(FailRequest {
                request: request.clone(),
            })
            .await?;
        Ok(())
    }

    /// Answers a blocked request with a synthetic response.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for a status code outside `100..=599` or
    ///   an empty header name
    /// - session and protocol errors
    pub async fn provide_response(&self, params: ProvideResponse) -> Result<()> {
        validate_status(params.status_code)?;
        validate_headers(params.headers.as_deref())?;

        self.session.send(params).await?;
        Ok(())
    }

    /// Sets the cache mode globally or for some contexts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty context list
    /// - session and protocol errors
    pub async fn set_cache_behavior(
        &self,
        cache_behavior: CacheBehavior,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> Result<()> {
        if let Some(contexts) = &contexts {
            require_items("cache contexts", contexts)?;
        }

        self.session
            .send(SetCacheBehavior {
                cache_behavior,
                contexts,
            })
            .await?;
        Ok(())
    }

    /// Registers a typed `network.beforeRequestSent` listener.
    ///
    /// Events arrive only while a subscription covers them.
    ///
    /// # Errors
    ///
    /// Never in practice; the method always has a decoder.
    pub fn on_before_request_sent<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&BeforeRequestSent) + Send + Sync + 'static,
    {
        self.session.on("network.beforeRequestSent", move |event| {
            if let BidiEvent::BeforeRequestSent(params) = event {
                listener(params);
            }
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_pattern(pattern: &UrlPattern) -> Result<()> {
    match pattern {
        UrlPattern::String { pattern } => require_non_empty("URL pattern", pattern),
        UrlPattern::Pattern { port, .. } => match port {
            Some(port) if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) => Err(
                Error::invalid_argument(format!("URL pattern port {port:?} is not numeric")),
            ),
            _ => Ok(()),
        },
    }
}

fn validate_method(method: &str) -> Result<()> {
    // HTTP token characters.
    let valid = !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        return Err(Error::invalid_argument(format!(
            "invalid HTTP method {method:?}"
        )));
    }
    Ok(())
}

fn validate_headers(headers: Option<&[Header]>) -> Result<()> {
    headers
        .unwrap_or_default()
        .iter()
        .try_for_each(|header| require_non_empty("header name", &header.name))
}

fn validate_status(status: Option<u16>) -> Result<()> {
    match status {
        Some(code) if !(100..=599).contains(&code) => Err(Error::invalid_argument(format!(
            "status code {code} is outside 100..=599"
        ))),
        _ => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::testing::{MockRemote, active_session};
    use crate::transport::ConnectionOptions;

    fn offline() -> NetworkManager {
        NetworkManager::new(Session::new(ConnectionOptions::default()))
    }

    #[tokio::test]
    async fn test_validation_fails_before_io() {
        let network = offline();

        let err = network.add_intercept(Vec::new(), None, None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let bad_port = UrlPattern::Pattern {
            protocol: None,
            hostname: Some("example.com".into()),
            port: Some("80a".into()),
            pathname: None,
            search: None,
        };
        let err = network
            .add_intercept(vec![InterceptPhase::BeforeRequestSent], None, Some(vec![bad_port]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let mut params = ContinueRequest::new("r".into());
        params.method = Some("GE T".into());
        assert!(network.continue_request(params).await.is_err());

        let mut params = ProvideResponse::new("r".into());
        params.status_code = Some(42);
        assert!(matches!(
            network.provide_response(params).await,
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_validate_method() {
        assert!(validate_method("GET").is_ok());
        assert!(validate_method("M-SEARCH").is_ok());
        assert!(validate_method("").is_err());
        assert!(validate_method("GET\n").is_err());
    }

    #[tokio::test]
    async fn test_add_intercept_and_continue() {
        let mut remote = MockRemote::start().await;
        let network = NetworkManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let network = network.clone();
            async move {
                let intercept = network
                    .add_intercept(
                        vec![InterceptPhase::BeforeRequestSent],
                        None,
                        Some(vec![UrlPattern::String {
                            pattern: "https://example.com/*".into(),
                        }]),
                    )
                    .await?;
                network
                    .continue_request(ContinueRequest::new("req-1".into()))
                    .await?;
                crate::Result::Ok(intercept)
            }
        });

        let command = remote
            .reply("network.addIntercept", json!({ "intercept": "i-1" }))
            .await;
        assert_eq!(
            command["params"],
            json!({
                "phases": ["beforeRequestSent"],
                "urlPatterns": [{ "type": "string", "pattern": "https://example.com/*" }]
            })
        );
        let command = remote.reply("network.continueRequest", json!({})).await;
        assert_eq!(command["params"], json!({ "request": "req-1" }));

        let intercept = assert_ok!(task.await.expect("join"));
        assert_eq!(intercept.as_str(), "i-1");
    }

    #[tokio::test]
    async fn test_continue_with_auth_splices_action() {
        let mut remote = MockRemote::start().await;
        let network = NetworkManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let network = network.clone();
            async move {
                network
                    .continue_with_auth(
                        &RequestId::new("req-2"),
                        AuthAction::ProvideCredentials {
                            credentials: AuthCredentials::Password {
                                username: "user".into(),
                                password: "pass".into(),
                            },
                        },
                    )
                    .await
            }
        });

        let command = remote.reply("network.continueWithAuth", json!({})).await;
        assert_eq!(
            command["params"],
            json!({
                "request": "req-2",
                "action": "provideCredentials",
                "credentials": { "type": "password", "username": "user", "password": "pass" }
            })
        );
        assert_ok!(task.await.expect("join"));
    }

    #[tokio::test]
    async fn test_typed_listener_receives_request() {
        let mut remote = MockRemote::start().await;
        let session = active_session(&mut remote).await;
        let network = NetworkManager::new(session.clone());

        let urls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&urls);
        assert_ok!(network.on_before_request_sent(move |event| {
            sink.lock().push(event.base.request.url.clone());
        }));

        remote
            .event(
                "network.beforeRequestSent",
                json!({
                    "context": "ctx",
                    "isBlocked": false,
                    "navigation": null,
                    "redirectCount": 0,
                    "request": {
                        "request": "req-3",
                        "url": "https://example.com/",
                        "method": "GET",
                        "headers": [],
                        "cookies": [],
                        "headersSize": 0,
                        "bodySize": 0,
                        "destination": "",
                        "initiatorType": null,
                        "timings": {
                            "timeOrigin": 0, "requestTime": 0, "redirectStart": 0,
                            "redirectEnd": 0, "fetchStart": 0, "dnsStart": 0, "dnsEnd": 0,
                            "connectStart": 0, "connectEnd": 0, "tlsStart": 0,
                            "requestStart": 0, "responseStart": 0, "responseEnd": 0
                        }
                    },
                    "timestamp": 1,
                    "initiator": { "type": "other" }
                }),
            )
            .await;

        // A round trip after the event guarantees it was dispatched.
        let task = tokio::spawn({
            let session = session.clone();
            async move { session.status().await }
        });
        remote
            .reply("session.status", json!({ "ready": false, "message": "" }))
            .await;
        assert_ok!(task.await.expect("join"));

        assert_eq!(*urls.lock(), ["https://example.com/"]);
    }
}

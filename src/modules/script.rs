//! `script` commands: evaluation, function calls, realms and preload scripts.
//!
//! [`ScriptManager::evaluate`] and [`ScriptManager::call_function`] return
//! the raw [`EvaluateResult`], where a thrown exception is a normal result.
//! The `*_json` variants turn a thrown exception into
//! [`Error::ScriptException`] and the completion value into plain JSON.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{BrowsingContextId, Handle, PreloadScriptId};
use crate::protocol::script::{
    AddPreloadScript, CallFunction, Disown, Evaluate, EvaluateResult, GetRealms, RealmInfo,
    RealmType, RemovePreloadScript, RemoteValue, Target,
};
use crate::session::Session;

use super::{require_items, require_non_empty};

// ============================================================================
// ScriptManager
// ============================================================================

/// Commands of the `script` module.
#[derive(Debug, Clone)]
pub struct ScriptManager {
    session: Session,
}

impl ScriptManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Registers a function to run in new realms before page scripts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty declaration, empty context
    ///   lists, or both `contexts` and `user_contexts` set
    /// - session and protocol errors
    pub async fn add_preload_script(&self, params: AddPreloadScript) -> Result<PreloadScriptId> {
        require_non_empty("function declaration", &params.function_declaration)?;
        if params.contexts.is_some() && params.user_contexts.is_some() {
            return Err(Error::invalid_argument(
                "contexts and user contexts are mutually exclusive",
            ));
        }
        if let Some(contexts) = &params.contexts {
            require_items("contexts", contexts)?;
        }
        if let Some(user_contexts) = &params.user_contexts {
            require_items("user contexts", user_contexts)?;
        }

        let script = self.session.send(params).await?.script;
        debug!(script = %script, "Preload script added");
        Ok(script)
    }

    /// Calls a function declaration in a realm.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty declaration
    /// - session and protocol errors
    pub async fn call_function(&self, params: CallFunction) -> Result<EvaluateResult> {
        require_non_empty("function declaration", &params.function_declaration)?;
        self.session.send(params).await
    }

    /// Calls a function and returns its completion value as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Self::call_function`], plus [`Error::ScriptException`] when
    /// the function throws.
    pub async fn call_function_json(&self, params: CallFunction) -> Result<Value> {
        completion_json(self.call_function(params).await?)
    }

    /// Releases handles so the remote end can collect their objects.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty handle list
    /// - session and protocol errors
    pub async fn disown(&self, handles: Vec<Handle>, target: Target) -> Result<()> {
        require_items("handles", &handles)?;
        self.session.send(Disown { handles, target }).await?;
        Ok(())
    }

    /// Evaluates an expression in a realm.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty expression
    /// - session and protocol errors
    pub async fn evaluate(&self, params: Evaluate) -> Result<EvaluateResult> {
        require_non_empty("expression", &params.expression)?;
        self.session.send(params).await
    }

    /// Evaluates an expression and returns its completion value as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`Self::evaluate`], plus [`Error::ScriptException`] when the
    /// expression throws.
    pub async fn evaluate_json(&self, params: Evaluate) -> Result<Value> {
        completion_json(self.evaluate(params).await?)
    }

    /// Lists realms, optionally narrowed to a context or a kind.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn get_realms(
        &self,
        context: Option<BrowsingContextId>,
        kind: Option<RealmType>,
    ) -> Result<Vec<RealmInfo>> {
        Ok(self.session.send(GetRealms { context, kind }).await?.realms)
    }

    /// Removes a preload script. Realms it already ran in are unaffected.
    ///
    /// # Errors
    ///
    /// Session and protocol errors; an unknown id is `no such script`.
    pub async fn remove_preload_script(&self, script: &PreloadScriptId) -> Result<()> {
        self.session
            .send(RemovePreloadScript {
                script: script.clone(),
            })
            .await?;
        Ok(())
    }
}

// ============================================================================
// Result Conversion
// ============================================================================

/// Converts an evaluation outcome into its completion value.
///
/// # Errors
///
/// [`Error::ScriptException`] for a thrown exception.
pub fn into_completion(result: EvaluateResult) -> Result<RemoteValue> {
    match result {
        EvaluateResult::Success { result, .. } => Ok(result),
        EvaluateResult::Exception {
            exception_details, ..
        } => Err(Error::script_exception(
            exception_details.text,
            exception_details.line_number,
            exception_details.column_number,
        )),
    }
}

/// Converts an evaluation outcome into JSON.
///
/// Values without a JSON form (nodes, functions, handles past the depth
/// limit) come back as `null`.
fn completion_json(result: EvaluateResult) -> Result<Value> {
    Ok(into_completion(result)?.to_json().unwrap_or(Value::Null))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio_test::assert_ok;

    use crate::testing::{MockRemote, active_session};
    use crate::transport::ConnectionOptions;

    fn ctx() -> Target {
        Target::context(BrowsingContextId::new("ctx"))
    }

    #[tokio::test]
    async fn test_local_validation() {
        let script = ScriptManager::new(Session::new(ConnectionOptions::default()));

        let err = script.evaluate(Evaluate::new("", ctx(), false)).await;
        assert!(matches!(err, Err(Error::InvalidArgument { .. })));

        let err = script.disown(Vec::new(), ctx()).await;
        assert!(matches!(err, Err(Error::InvalidArgument { .. })));

        let mut preload = AddPreloadScript::new("() => {}");
        preload.contexts = Some(vec![BrowsingContextId::new("a")]);
        preload.user_contexts = Some(vec!["default".into()]);
        let err = script.add_preload_script(preload).await;
        assert!(matches!(err, Err(Error::InvalidArgument { .. })));
    }

    #[tokio::test]
    async fn test_evaluate_success() {
        let mut remote = MockRemote::start().await;
        let script = ScriptManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let script = script.clone();
            async move { script.evaluate_json(Evaluate::new("1 + 2", ctx(), true)).await }
        });

        let command = remote
            .reply(
                "script.evaluate",
                json!({
                    "type": "success",
                    "realm": "realm-1",
                    "result": { "type": "number", "value": 3 }
                }),
            )
            .await;
        assert_eq!(
            command["params"],
            json!({ "expression": "1 + 2", "target": { "context": "ctx" }, "awaitPromise": true })
        );

        let value = assert_ok!(task.await.expect("join"));
        assert_eq!(value, json!(3.0));
    }

    #[tokio::test]
    async fn test_evaluate_exception_becomes_error() {
        let mut remote = MockRemote::start().await;
        let script = ScriptManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let script = script.clone();
            async move {
                script
                    .evaluate_json(Evaluate::new("boom()", ctx(), false))
                    .await
            }
        });

        remote
            .reply(
                "script.evaluate",
                json!({
                    "type": "exception",
                    "realm": "realm-1",
                    "exceptionDetails": {
                        "columnNumber": 0,
                        "lineNumber": 0,
                        "exception": { "type": "error" },
                        "stackTrace": { "callFrames": [] },
                        "text": "ReferenceError: boom is not defined"
                    }
                }),
            )
            .await;

        match task.await.expect("join") {
            Err(Error::ScriptException { message, .. }) => {
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preload_script_lifecycle() {
        let mut remote = MockRemote::start().await;
        let script = ScriptManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let script = script.clone();
            async move {
                let id = script
                    .add_preload_script(AddPreloadScript::new("() => { window.x = 1; }"))
                    .await?;
                script.remove_preload_script(&id).await?;
                crate::Result::Ok(id)
            }
        });

        let command = remote
            .reply("script.addPreloadScript", json!({ "script": "ps-1" }))
            .await;
        assert_eq!(
            command["params"],
            json!({ "functionDeclaration": "() => { window.x = 1; }" })
        );
        let command = remote.reply("script.removePreloadScript", json!({})).await;
        assert_eq!(command["params"], json!({ "script": "ps-1" }));

        let id = assert_ok!(task.await.expect("join"));
        assert_eq!(id.as_str(), "ps-1");
    }

    #[tokio::test]
    async fn test_get_realms_filters() {
        let mut remote = MockRemote::start().await;
        let script = ScriptManager::new(active_session(&mut remote).await);

        let task = tokio::spawn({
            let script = script.clone();
            async move {
                script
                    .get_realms(Some(BrowsingContextId::new("ctx")), Some(RealmType::Window))
                    .await
            }
        });

        let command = remote
            .reply(
                "script.getRealms",
                json!({ "realms": [{
                    "realm": "realm-1", "origin": "null", "type": "window", "context": "ctx"
                }] }),
            )
            .await;
        assert_eq!(command["params"], json!({ "context": "ctx", "type": "window" }));

        let realms = assert_ok!(task.await.expect("join"));
        assert_eq!(realms.len(), 1);
        assert_eq!(realms[0].kind, RealmType::Window);
    }
}

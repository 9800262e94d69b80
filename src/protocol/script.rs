//! `script` module: realms, values, evaluation.
//!
//! Values cross the wire in two directions with different grammars:
//! [`LocalValue`] is what the client sends (arguments, `this`), and
//! [`RemoteValue`] is what the remote end serializes back. Both are tagged
//! by `type`, with the payload under `value`.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::codec::{WireEnum, unknown_value_message, wire_enum};
use crate::identifiers::{
    BrowsingContextId, ChannelId, Handle, PreloadScriptId, RealmId, SharedId, UserContextId,
};

// ============================================================================
// Enums
// ============================================================================

wire_enum! {
    /// Kind of script realm.
    pub enum RealmType {
        /// Window global.
        Window => "window",
        /// Dedicated worker.
        DedicatedWorker => "dedicated-worker",
        /// Shared worker.
        SharedWorker => "shared-worker",
        /// Service worker.
        ServiceWorker => "service-worker",
        /// Generic worker.
        Worker => "worker",
        /// Paint worklet.
        PaintWorklet => "paint-worklet",
        /// Audio worklet.
        AudioWorklet => "audio-worklet",
        /// Generic worklet.
        Worklet => "worklet",
    }
}

wire_enum! {
    /// Whether the remote end keeps a handle to a returned object.
    pub enum ResultOwnership {
        /// Keep the object alive and return a handle.
        Root => "root",
        /// No handle.
        None => "none",
    }
}

wire_enum! {
    /// Shadow tree serialization depth.
    pub enum IncludeShadowTree {
        /// No shadow roots.
        None => "none",
        /// Open shadow roots only.
        Open => "open",
        /// All shadow roots.
        All => "all",
    }
}

wire_enum! {
    /// Shadow root mode reported on node values.
    pub enum ShadowRootMode {
        /// Open shadow root.
        Open => "open",
        /// Closed shadow root.
        Closed => "closed",
    }
}

wire_enum! {
    /// Numbers JSON cannot represent.
    pub enum SpecialNumber {
        /// Not a number.
        NaN => "NaN",
        /// Negative zero.
        NegativeZero => "-0",
        /// Positive infinity.
        Infinity => "Infinity",
        /// Negative infinity.
        NegativeInfinity => "-Infinity",
    }
}

// ============================================================================
// NumberValue
// ============================================================================

/// A JavaScript number: finite JSON number or one of the special strings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumberValue {
    /// Finite value.
    Finite(f64),
    /// `NaN`, `-0`, `Infinity` or `-Infinity`.
    Special(SpecialNumber),
}

impl<'de> Deserialize<'de> for NumberValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number
                .as_f64()
                .map(Self::Finite)
                .ok_or_else(|| D::Error::custom("number is not representable as f64")),
            Value::String(special) => SpecialNumber::from_wire(&special)
                .map(Self::Special)
                .ok_or_else(|| {
                    D::Error::custom(unknown_value_message(SpecialNumber::TYPE_NAME, &special))
                }),
            _ => Err(D::Error::custom("number must be a JSON number or a string")),
        }
    }
}

impl From<f64> for NumberValue {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::Special(SpecialNumber::NaN)
        } else if value == f64::INFINITY {
            Self::Special(SpecialNumber::Infinity)
        } else if value == f64::NEG_INFINITY {
            Self::Special(SpecialNumber::NegativeInfinity)
        } else if value == 0.0 && value.is_sign_negative() {
            Self::Special(SpecialNumber::NegativeZero)
        } else {
            Self::Finite(value)
        }
    }
}

// ============================================================================
// References & Targets
// ============================================================================

/// Reference to a DOM node by its shared id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedReference {
    /// Shared node id.
    pub shared_id: SharedId,
    /// Handle, if the node is also rooted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
}

impl SharedReference {
    /// Creates a reference to a shared node.
    #[inline]
    #[must_use]
    pub fn new(shared_id: impl Into<SharedId>) -> Self {
        Self {
            shared_id: shared_id.into(),
            handle: None,
        }
    }
}

/// Reference to a rooted remote object by handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObjectReference {
    /// Object handle.
    pub handle: Handle,
    /// Shared id, if the object is a node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_id: Option<SharedId>,
}

/// Either kind of remote reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteReference {
    /// Node reference.
    Shared(SharedReference),
    /// Object handle reference.
    Object(RemoteObjectReference),
}

/// Browsing context target, optionally inside a named sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTarget {
    /// Target context.
    pub context: BrowsingContextId,
    /// Sandbox name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

/// Realm target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmTarget {
    /// Target realm.
    pub realm: RealmId,
}

/// Where a script runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// A browsing context's window realm.
    Context(ContextTarget),
    /// An explicit realm.
    Realm(RealmTarget),
}

impl Target {
    /// Targets the default realm of a browsing context.
    #[inline]
    #[must_use]
    pub fn context(context: BrowsingContextId) -> Self {
        Self::Context(ContextTarget {
            context,
            sandbox: None,
        })
    }

    /// Targets a named sandbox in a browsing context.
    #[inline]
    #[must_use]
    pub fn sandbox(context: BrowsingContextId, sandbox: impl Into<String>) -> Self {
        Self::Context(ContextTarget {
            context,
            sandbox: Some(sandbox.into()),
        })
    }

    /// Targets a realm.
    #[inline]
    #[must_use]
    pub fn realm(realm: RealmId) -> Self {
        Self::Realm(RealmTarget { realm })
    }
}

/// Origin of a script message or log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Realm the message came from.
    pub realm: RealmId,
    /// Owning context, for window realms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
}

// ============================================================================
// Serialization Options
// ============================================================================

/// Limits on how deep the remote end serializes results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationOptions {
    /// Maximum DOM depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dom_depth: Option<u64>,
    /// Maximum object depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_object_depth: Option<u64>,
    /// Shadow tree inclusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_shadow_tree: Option<IncludeShadowTree>,
}

/// Regular expression literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegExpValue {
    /// Pattern source.
    pub pattern: String,
    /// Flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// Channel that forwards `script.message` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProperties {
    /// Channel id echoed in `script.message`.
    pub channel: ChannelId,
    /// Serialization of message payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Ownership of message payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<ResultOwnership>,
}

/// `{"type":"channel","value":{...}}` argument of a preload script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ChannelValue {
    /// The only variant.
    Channel(ChannelProperties),
}

// ============================================================================
// LocalValue
// ============================================================================

/// Value sent to the remote end as an argument or `this`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocalValue {
    /// Reference to an existing remote object.
    Reference(RemoteReference),
    /// Value serialized by the client.
    Typed(TypedLocalValue),
}

impl<'de> Deserialize<'de> for LocalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(map) = &value else {
            return Err(D::Error::custom("local value must be an object"));
        };

        // `type` selects a client-serialized value; references carry none.
        if map.contains_key("type") {
            TypedLocalValue::deserialize(value)
                .map(Self::Typed)
                .map_err(D::Error::custom)
        } else if map.contains_key("sharedId") || map.contains_key("handle") {
            RemoteReference::deserialize(value)
                .map(Self::Reference)
                .map_err(D::Error::custom)
        } else {
            Err(D::Error::missing_field("type"))
        }
    }
}

/// Key of a map or object entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingKey {
    /// Plain string key.
    Text(String),
    /// Arbitrary value key (maps only).
    Value(LocalValue),
}

/// Client-serialized value, tagged by `type` with payload under `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedLocalValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// String.
    String(String),
    /// Number.
    Number(NumberValue),
    /// Boolean.
    Boolean(bool),
    /// BigInt in decimal form.
    BigInt(String),
    /// Array.
    Array(Vec<LocalValue>),
    /// Date string.
    Date(String),
    /// `Map` entries.
    Map(Vec<(MappingKey, LocalValue)>),
    /// Plain object entries.
    Object(Vec<(MappingKey, LocalValue)>),
    /// Regular expression.
    RegExp(RegExpValue),
    /// `Set` members.
    Set(Vec<LocalValue>),
    /// Message channel.
    Channel(ChannelProperties),
}

impl LocalValue {
    /// `undefined`.
    #[inline]
    #[must_use]
    pub fn undefined() -> Self {
        Self::Typed(TypedLocalValue::Undefined)
    }

    /// `null`.
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::Typed(TypedLocalValue::Null)
    }

    /// String value.
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Typed(TypedLocalValue::String(value.into()))
    }

    /// Number value.
    #[inline]
    #[must_use]
    pub fn number(value: f64) -> Self {
        Self::Typed(TypedLocalValue::Number(value.into()))
    }

    /// Boolean value.
    #[inline]
    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::Typed(TypedLocalValue::Boolean(value))
    }

    /// Reference to a DOM node.
    #[inline]
    #[must_use]
    pub fn node(reference: SharedReference) -> Self {
        Self::Reference(RemoteReference::Shared(reference))
    }

    /// Converts arbitrary JSON into a local value (objects become plain objects).
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::null(),
            Value::Bool(b) => Self::boolean(*b),
            Value::Number(n) => Self::number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::string(s.clone()),
            Value::Array(items) => {
                Self::Typed(TypedLocalValue::Array(items.iter().map(Self::from_json).collect()))
            }
            Value::Object(map) => Self::Typed(TypedLocalValue::Object(
                map.iter()
                    .map(|(k, v)| (MappingKey::Text(k.clone()), Self::from_json(v)))
                    .collect(),
            )),
        }
    }
}

// ============================================================================
// RemoteValue
// ============================================================================

/// Handle and internal id shared by every remote object value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectHandle {
    /// Handle, when ownership was `root`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<Handle>,
    /// Id for cycle detection within one serialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<String>,
}

/// Key of a serialized map or object entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteMappingKey {
    /// Plain string key.
    Text(String),
    /// Value key.
    Value(RemoteValue),
}

/// Serialized DOM node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    /// DOM `nodeType`.
    pub node_type: u32,
    /// Number of children.
    pub child_node_count: u32,
    /// Element attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Serialized children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RemoteValue>>,
    /// Element local name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
    /// Shadow root mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ShadowRootMode>,
    /// Namespace URI.
    #[serde(rename = "namespaceURI", skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,
    /// Node value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_value: Option<String>,
    /// Shadow root node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_root: Option<Box<RemoteValue>>,
}

/// Serialized `WindowProxy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProxyProperties {
    /// Context the window belongs to.
    pub context: BrowsingContextId,
}

/// Value serialized by the remote end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum RemoteValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// String.
    String {
        /// Value.
        value: String,
    },
    /// Number.
    Number {
        /// Value.
        value: NumberValue,
    },
    /// Boolean.
    Boolean {
        /// Value.
        value: bool,
    },
    /// BigInt.
    BigInt {
        /// Decimal digits.
        value: String,
    },
    /// Symbol.
    Symbol(ObjectHandle),
    /// Array.
    Array {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Items, absent past the depth limit.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<RemoteValue>>,
    },
    /// Plain object.
    Object {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Entries, absent past the depth limit.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<(RemoteMappingKey, RemoteValue)>>,
    },
    /// Function.
    Function(ObjectHandle),
    /// Regular expression.
    RegExp {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Pattern and flags.
        value: RegExpValue,
    },
    /// Date.
    Date {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// ISO string.
        value: String,
    },
    /// `Map`.
    Map {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Entries.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<(RemoteMappingKey, RemoteValue)>>,
    },
    /// `Set`.
    Set {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Members.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<RemoteValue>>,
    },
    /// `WeakMap`.
    WeakMap(ObjectHandle),
    /// `WeakSet`.
    WeakSet(ObjectHandle),
    /// Generator.
    Generator(ObjectHandle),
    /// Error object.
    Error(ObjectHandle),
    /// Proxy.
    Proxy(ObjectHandle),
    /// Promise.
    Promise(ObjectHandle),
    /// Typed array.
    TypedArray(ObjectHandle),
    /// `ArrayBuffer`.
    ArrayBuffer(ObjectHandle),
    /// `NodeList`.
    NodeList {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Nodes.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<RemoteValue>>,
    },
    /// `HTMLCollection`.
    HtmlCollection {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Nodes.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Vec<RemoteValue>>,
    },
    /// DOM node.
    Node {
        /// Shared id usable as a [`SharedReference`].
        #[serde(skip_serializing_if = "Option::is_none")]
        shared_id: Option<SharedId>,
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Node details.
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Box<NodeProperties>>,
    },
    /// `WindowProxy`.
    Window {
        /// Handle.
        #[serde(flatten)]
        object: ObjectHandle,
        /// Window context.
        value: WindowProxyProperties,
    },
}

impl RemoteValue {
    /// Returns the node reference for a `node` value.
    #[must_use]
    pub fn shared_reference(&self) -> Option<SharedReference> {
        match self {
            Self::Node {
                shared_id: Some(shared_id),
                object,
                ..
            } => Some(SharedReference {
                shared_id: shared_id.clone(),
                handle: object.handle.clone(),
            }),
            _ => None,
        }
    }

    /// Converts primitives, arrays and plain objects to JSON.
    ///
    /// Returns `None` for values JSON cannot express (nodes, functions,
    /// special numbers, depth-truncated containers).
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Undefined | Self::Null => Some(Value::Null),
            Self::String { value } | Self::BigInt { value } => Some(Value::String(value.clone())),
            Self::Boolean { value } => Some(Value::Bool(*value)),
            Self::Number {
                value: NumberValue::Finite(n),
            } => Number::from_f64(*n).map(Value::Number),
            Self::Date { value, .. } => Some(Value::String(value.clone())),
            Self::Array {
                value: Some(items), ..
            }
            | Self::Set {
                value: Some(items), ..
            } => items
                .iter()
                .map(Self::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Self::Object {
                value: Some(entries),
                ..
            }
            | Self::Map {
                value: Some(entries),
                ..
            } => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        RemoteMappingKey::Text(text) => text.clone(),
                        RemoteMappingKey::Value(Self::String { value }) => value.clone(),
                        RemoteMappingKey::Value(_) => return None,
                    };
                    map.insert(key, value.to_json()?);
                }
                Some(Value::Object(map))
            }
            _ => None,
        }
    }
}

// ============================================================================
// Results & Realms
// ============================================================================

/// One frame of a JavaScript stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Column (0-based).
    pub column_number: u64,
    /// Function name.
    pub function_name: String,
    /// Line (0-based).
    pub line_number: u64,
    /// Script URL.
    pub url: String,
}

/// JavaScript stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    /// Frames, innermost first.
    pub call_frames: Vec<StackFrame>,
}

/// Details of a thrown exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Column of the throw.
    pub column_number: u64,
    /// Thrown value.
    pub exception: RemoteValue,
    /// Line of the throw.
    pub line_number: u64,
    /// Stack at the throw.
    pub stack_trace: StackTrace,
    /// Exception text.
    pub text: String,
}

/// Result of `script.evaluate` and `script.callFunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum EvaluateResult {
    /// Script completed.
    Success {
        /// Completion value.
        result: RemoteValue,
        /// Realm the script ran in.
        realm: RealmId,
    },
    /// Script threw.
    Exception {
        /// Exception details.
        exception_details: ExceptionDetails,
        /// Realm the script ran in.
        realm: RealmId,
    },
}

impl EvaluateResult {
    /// Returns the realm the script ran in.
    #[inline]
    #[must_use]
    pub fn realm(&self) -> &RealmId {
        match self {
            Self::Success { realm, .. } | Self::Exception { realm, .. } => realm,
        }
    }
}

/// Description of a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmInfo {
    /// Realm id.
    pub realm: RealmId,
    /// Serialized origin.
    pub origin: String,
    /// Realm kind.
    #[serde(rename = "type")]
    pub kind: RealmType,
    /// Owning context, for window realms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
    /// Sandbox name, for sandboxed window realms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
    /// Owner realms, for workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<RealmId>>,
}

// ============================================================================
// Commands
// ============================================================================

/// `script.addPreloadScript`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPreloadScript {
    /// Function declaration run before any page script.
    pub function_declaration: String,
    /// Channel arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<ChannelValue>>,
    /// Restrict to these top-level contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<BrowsingContextId>>,
    /// Restrict to these user contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_contexts: Option<Vec<UserContextId>>,
    /// Sandbox name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

impl AddPreloadScript {
    /// Creates a preload script for every context.
    #[inline]
    #[must_use]
    pub fn new(function_declaration: impl Into<String>) -> Self {
        Self {
            function_declaration: function_declaration.into(),
            arguments: None,
            contexts: None,
            user_contexts: None,
            sandbox: None,
        }
    }
}

/// Result of `script.addPreloadScript`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPreloadScriptResult {
    /// New preload script id.
    pub script: PreloadScriptId,
}

/// `script.callFunction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunction {
    /// Function declaration source.
    pub function_declaration: String,
    /// Await a returned promise.
    pub await_promise: bool,
    /// Where to run.
    pub target: Target,
    /// Arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<LocalValue>>,
    /// Ownership of the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    /// Result serialization limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// `this` binding.
    #[serde(rename = "this", skip_serializing_if = "Option::is_none")]
    pub this: Option<LocalValue>,
    /// Simulate a user activation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_activation: Option<bool>,
}

impl CallFunction {
    /// Creates a call with no arguments.
    #[inline]
    #[must_use]
    pub fn new(function_declaration: impl Into<String>, target: Target, await_promise: bool) -> Self {
        Self {
            function_declaration: function_declaration.into(),
            await_promise,
            target,
            arguments: None,
            result_ownership: None,
            serialization_options: None,
            this: None,
            user_activation: None,
        }
    }

    /// Sets the arguments.
    #[inline]
    #[must_use]
    pub fn with_arguments(mut self, arguments: Vec<LocalValue>) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// `script.disown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disown {
    /// Handles to release.
    pub handles: Vec<Handle>,
    /// Realm owning them.
    pub target: Target,
}

/// `script.evaluate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluate {
    /// Expression source.
    pub expression: String,
    /// Where to run.
    pub target: Target,
    /// Await a returned promise.
    pub await_promise: bool,
    /// Ownership of the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_ownership: Option<ResultOwnership>,
    /// Result serialization limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialization_options: Option<SerializationOptions>,
    /// Simulate a user activation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_activation: Option<bool>,
}

impl Evaluate {
    /// Creates an evaluation.
    #[inline]
    #[must_use]
    pub fn new(expression: impl Into<String>, target: Target, await_promise: bool) -> Self {
        Self {
            expression: expression.into(),
            target,
            await_promise,
            result_ownership: None,
            serialization_options: None,
            user_activation: None,
        }
    }
}

/// `script.getRealms`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRealms {
    /// Only realms of this context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BrowsingContextId>,
    /// Only realms of this kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RealmType>,
}

/// Result of `script.getRealms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRealmsResult {
    /// Matching realms.
    pub realms: Vec<RealmInfo>,
}

/// `script.removePreloadScript`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovePreloadScript {
    /// Script to remove.
    pub script: PreloadScriptId,
}

// ============================================================================
// Events
// ============================================================================

/// `script.message` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Channel the message was posted on.
    pub channel: ChannelId,
    /// Posted value.
    pub data: RemoteValue,
    /// Where it came from.
    pub source: Source,
}

/// `script.realmDestroyed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealmDestroyed {
    /// Destroyed realm.
    pub realm: RealmId,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::codec::Codec;
    use crate::error::Error;
    use crate::testing::{assert_round_trip, assert_unknown_variant};

    #[test]
    fn test_local_value_wire_forms() {
        assert_eq!(
            serde_json::to_value(LocalValue::undefined()).expect("encode"),
            json!({ "type": "undefined" })
        );
        assert_eq!(
            serde_json::to_value(LocalValue::string("hi")).expect("encode"),
            json!({ "type": "string", "value": "hi" })
        );
        assert_eq!(
            serde_json::to_value(LocalValue::number(f64::NEG_INFINITY)).expect("encode"),
            json!({ "type": "number", "value": "-Infinity" })
        );
    }

    #[test]
    fn test_local_value_from_json_object() {
        let value = LocalValue::from_json(&json!({ "a": [1, true] }));
        assert_eq!(
            serde_json::to_value(value).expect("encode"),
            json!({
                "type": "object",
                "value": [["a", { "type": "array", "value": [
                    { "type": "number", "value": 1.0 },
                    { "type": "boolean", "value": true }
                ]}]]
            })
        );
    }

    #[test]
    fn test_node_reference_is_untagged() {
        let value = LocalValue::node(SharedReference::new("node-1"));
        assert_eq!(
            serde_json::to_value(value).expect("encode"),
            json!({ "sharedId": "node-1" })
        );
    }

    #[test]
    fn test_target_shapes() {
        let context = Target::context(BrowsingContextId::new("ctx"));
        let realm = Target::realm(RealmId::new("r1"));
        assert_eq!(serde_json::to_value(&context).expect("encode"), json!({ "context": "ctx" }));
        assert_eq!(serde_json::to_value(&realm).expect("encode"), json!({ "realm": "r1" }));

        let decoded: Target = serde_json::from_value(json!({ "realm": "r1" })).expect("decode");
        assert_eq!(decoded, realm);
    }

    #[test]
    fn test_evaluate_result_success() {
        let result: EvaluateResult = serde_json::from_value(json!({
            "type": "success",
            "realm": "r1",
            "result": { "type": "number", "value": 42 }
        }))
        .expect("decode");

        match result {
            EvaluateResult::Success { result, realm } => {
                assert_eq!(realm.as_str(), "r1");
                assert_eq!(result.to_json(), Some(json!(42.0)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_result_exception() {
        let result: EvaluateResult = serde_json::from_value(json!({
            "type": "exception",
            "realm": "r1",
            "exceptionDetails": {
                "columnNumber": 0,
                "lineNumber": 1,
                "text": "ReferenceError: x is not defined",
                "exception": { "type": "error", "handle": "h-1" },
                "stackTrace": { "callFrames": [] }
            }
        }))
        .expect("decode");

        assert!(matches!(result, EvaluateResult::Exception { .. }));
        assert_eq!(result.realm().as_str(), "r1");
    }

    #[test]
    fn test_remote_node_shared_reference() {
        let node: RemoteValue = serde_json::from_value(json!({
            "type": "node",
            "sharedId": "s-1",
            "value": { "nodeType": 1, "childNodeCount": 0, "localName": "div" }
        }))
        .expect("decode");

        let reference = node.shared_reference().expect("node reference");
        assert_eq!(reference.shared_id.as_str(), "s-1");
        assert_eq!(node.to_json(), None);
    }

    #[test]
    fn test_remote_object_to_json() {
        let value: RemoteValue = serde_json::from_value(json!({
            "type": "object",
            "value": [["name", { "type": "string", "value": "x" }]]
        }))
        .expect("decode");

        assert_eq!(value.to_json(), Some(json!({ "name": "x" })));
    }

    #[test]
    fn test_special_number_round_trip() {
        let value: RemoteValue =
            serde_json::from_value(json!({ "type": "number", "value": "NaN" })).expect("decode");
        assert_eq!(
            value,
            RemoteValue::Number {
                value: NumberValue::Special(SpecialNumber::NaN)
            }
        );
        assert_eq!(value.to_json(), None);
    }

    #[test]
    fn test_local_value_round_trips() {
        let values = vec![
            LocalValue::undefined(),
            LocalValue::null(),
            LocalValue::string("text"),
            LocalValue::number(1.5),
            LocalValue::number(f64::NEG_INFINITY),
            LocalValue::number(-0.0),
            LocalValue::boolean(false),
            LocalValue::Typed(TypedLocalValue::BigInt("9007199254740993".into())),
            LocalValue::Typed(TypedLocalValue::Date("2024-01-01T00:00:00Z".into())),
            LocalValue::Typed(TypedLocalValue::RegExp(RegExpValue {
                pattern: "a+".into(),
                flags: Some("g".into()),
            })),
            LocalValue::Typed(TypedLocalValue::Set(vec![LocalValue::number(1.0)])),
            LocalValue::Typed(TypedLocalValue::Map(vec![(
                MappingKey::Value(LocalValue::number(2.0)),
                LocalValue::string("two"),
            )])),
            LocalValue::from_json(&json!({ "a": [1, true, null], "b": "x" })),
            LocalValue::node(SharedReference::new("node-1")),
            LocalValue::Reference(RemoteReference::Object(RemoteObjectReference {
                handle: Handle::new("h-1"),
                shared_id: None,
            })),
        ];

        for value in &values {
            assert_round_trip(value);
        }
    }

    #[test]
    fn test_remote_value_round_trips() {
        let values = vec![
            RemoteValue::Undefined,
            RemoteValue::Null,
            RemoteValue::String {
                value: "text".into(),
            },
            RemoteValue::Number {
                value: NumberValue::Special(SpecialNumber::NegativeZero),
            },
            RemoteValue::Promise(ObjectHandle {
                handle: Some(Handle::new("h-1")),
                internal_id: None,
            }),
            RemoteValue::Array {
                object: ObjectHandle::default(),
                value: Some(vec![RemoteValue::Boolean { value: true }]),
            },
            RemoteValue::Map {
                object: ObjectHandle {
                    handle: None,
                    internal_id: Some("3".into()),
                },
                value: Some(vec![(
                    RemoteMappingKey::Value(RemoteValue::Number {
                        value: NumberValue::Finite(1.0),
                    }),
                    RemoteValue::String { value: "one".into() },
                )]),
            },
            RemoteValue::Node {
                shared_id: Some(SharedId::new("s-1")),
                object: ObjectHandle::default(),
                value: Some(Box::new(NodeProperties {
                    node_type: 1,
                    child_node_count: 0,
                    attributes: Some(BTreeMap::from([("id".to_string(), "main".to_string())])),
                    children: None,
                    local_name: Some("div".into()),
                    mode: None,
                    namespace_uri: None,
                    node_value: None,
                    shadow_root: None,
                })),
            },
            RemoteValue::Window {
                object: ObjectHandle::default(),
                value: WindowProxyProperties {
                    context: BrowsingContextId::new("ctx"),
                },
            },
        ];

        for value in &values {
            assert_round_trip(value);
        }
    }

    #[test]
    fn test_unknown_value_types_are_rejected() {
        assert_unknown_variant::<LocalValue>(json!({ "type": "bogus" }), "bogus");
        assert_unknown_variant::<RemoteValue>(json!({ "type": "bogus" }), "bogus");
        assert_unknown_variant::<LocalValue>(
            json!({ "type": "array", "value": [{ "type": "symbol" }] }),
            "symbol",
        );
    }

    #[test]
    fn test_unknown_special_number_is_typed() {
        let codec = Codec::new();
        match codec.decode::<RemoteValue>(json!({ "type": "number", "value": "Infinityy" })) {
            Err(Error::UnknownEnumValue { type_name, value }) => {
                assert_eq!(type_name, "SpecialNumber");
                assert_eq!(value, "Infinityy");
            }
            other => panic!("expected UnknownEnumValue, got {other:?}"),
        }

        match codec.decode::<LocalValue>(json!({ "type": "number", "value": "-NaN" })) {
            Err(Error::UnknownEnumValue { type_name, value }) => {
                assert_eq!(type_name, "SpecialNumber");
                assert_eq!(value, "-NaN");
            }
            other => panic!("expected UnknownEnumValue, got {other:?}"),
        }
    }
}

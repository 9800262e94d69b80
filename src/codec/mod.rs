//! Wire codec: typed values to and from WebDriver BiDi JSON.
//!
//! The protocol's type grammar has four shapes, each mapped statically:
//!
//! | Shape | Wire form | Rust form |
//! |-------|-----------|-----------|
//! | Identifier wrapper | bare string | `#[serde(transparent)]` newtype |
//! | Enum wrapper | one string of a closed set | [`wire_enum!`] + [`WireEnum`] |
//! | Tagged union | object with a discriminant field | `#[serde(tag = "...")]` enum |
//! | Lifted wrapper | payload members spliced onto the parent | `#[serde(flatten)]` field |
//!
//! Optional fields are `Option<T>` with `skip_serializing_if`, so absence is
//! the only "not specified" signal and `null` is never written.
//!
//! A [`Codec`] is constructed once and shared by reference (`Arc`) with the
//! transport, the event dispatcher and the module managers. It owns the
//! `method -> payload decoder` table for events and turns serde failures into
//! the crate's typed decode errors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::event::{BidiEvent, EVENT_DECODERS, EventDecoder};
use crate::protocol::message::{CommandFrame, Message};
use crate::protocol::Command;

// ============================================================================
// Constants
// ============================================================================

/// Prefix of the message produced when an enum wrapper rejects a string.
const UNKNOWN_VALUE_PREFIX: &str = "unknown value `";

/// Prefix serde uses when a tag names no declared variant.
const UNKNOWN_VARIANT_PREFIX: &str = "unknown variant `";

// ============================================================================
// WireEnum
// ============================================================================

/// A closed enumeration whose wire form is a single string literal.
///
/// Implemented by [`wire_enum!`]; lookups are case-exact.
pub trait WireEnum: Sized + Copy + 'static {
    /// Type name reported in decode errors.
    const TYPE_NAME: &'static str;

    /// Every wire literal, in declaration order.
    const VARIANTS: &'static [&'static str];

    /// Returns the wire literal for this variant.
    fn as_wire(&self) -> &'static str;

    /// Looks up a variant by its wire literal.
    fn from_wire(value: &str) -> Option<Self>;

    /// Looks up a variant, failing with [`Error::UnknownEnumValue`].
    fn parse_wire(value: &str) -> Result<Self> {
        Self::from_wire(value).ok_or_else(|| Error::unknown_enum_value(Self::TYPE_NAME, value))
    }
}

/// Deserializes an enum wrapper from a bare JSON string.
#[doc(hidden)]
pub fn deserialize_wire_enum<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: WireEnum,
{
    let raw = String::deserialize(deserializer)?;
    T::from_wire(&raw).ok_or_else(|| D::Error::custom(unknown_value_message(T::TYPE_NAME, &raw)))
}

/// Message a custom deserializer reports for a string outside a closed set.
///
/// [`Codec::decode`] turns it into [`Error::UnknownEnumValue`].
pub(crate) fn unknown_value_message(type_name: &str, value: &str) -> String {
    format!("{UNKNOWN_VALUE_PREFIX}{value}` for {type_name}")
}

/// Declares an enum wrapper: a Rust enum with a fixed wire string per variant.
///
/// Generates the enum plus [`WireEnum`], `Serialize`, `Deserialize` and
/// `Display` implementations.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::codec::WireEnum for $name {
            const TYPE_NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [&'static str] = &[$($wire),+];

            fn as_wire(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            fn from_wire(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str($crate::codec::WireEnum::as_wire(self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::codec::deserialize_wire_enum(deserializer)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::codec::WireEnum::as_wire(self))
            }
        }
    };
}

pub(crate) use wire_enum;

// ============================================================================
// MalformedMessage
// ============================================================================

/// An inbound frame that could not be decoded into a [`Message`].
///
/// Carries the command id when the frame had a readable one, so the
/// transport can fail that single command instead of dropping it.
#[derive(Debug)]
pub struct MalformedMessage {
    /// Id read from the frame, if any.
    pub id: Option<CommandId>,
    /// Why decoding failed.
    pub error: Error,
}

// ============================================================================
// Codec
// ============================================================================

/// Explicitly constructed codec shared by transport, dispatcher and managers.
pub struct Codec {
    /// Event method to typed payload decoder.
    events: FxHashMap<&'static str, EventDecoder>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("event_decoders", &self.events.len())
            .finish()
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    /// Creates a codec with the built-in event decoder table.
    #[must_use]
    pub fn new() -> Self {
        let events = EVENT_DECODERS
            .iter()
            .map(|(method, decoder)| (*method, *decoder))
            .collect();
        Self { events }
    }

    /// Encodes a typed value to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        Ok(serde_json::to_value(value)?)
    }

    /// Decodes JSON into a typed value.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownEnumValue`] if an enum wrapper saw an undeclared string
    /// - [`Error::UnknownVariant`] if a tagged union saw an undeclared discriminant
    /// - [`Error::Decode`] for any other shape mismatch
    pub fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| classify(&e, &short_type_name::<T>()))
    }

    /// Decodes a JSON text into a typed value.
    ///
    /// # Errors
    ///
    /// Same as [`Codec::decode`], plus [`Error::Json`] for invalid JSON syntax.
    pub fn decode_str<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        let value: Value = serde_json::from_str(text)?;
        self.decode(value)
    }

    /// Encodes an outbound command frame `{id, method, params}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the params fail to serialize.
    pub fn encode_command(&self, id: CommandId, command: &Command) -> Result<String> {
        Ok(serde_json::to_string(&CommandFrame { id, command })?)
    }

    /// Decodes one inbound frame into success, error or event.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedMessage`] carrying the frame's id, if readable.
    pub fn decode_message(&self, text: &str) -> std::result::Result<Message, MalformedMessage> {
        let value: Value = serde_json::from_str(text).map_err(|e| MalformedMessage {
            id: None,
            error: Error::Json(e),
        })?;

        let id = value.get("id").and_then(Value::as_u64).map(CommandId::new);

        self.decode::<Message>(value)
            .map_err(|error| MalformedMessage { id, error })
    }

    /// Returns `true` if a typed payload decoder is registered for `method`.
    #[inline]
    #[must_use]
    pub fn has_event_decoder(&self, method: &str) -> bool {
        self.events.contains_key(method)
    }

    /// Decodes an event payload with the decoder registered for `method`.
    ///
    /// Returns `None` when no decoder is registered.
    pub fn decode_event(&self, method: &str, params: Value) -> Option<Result<BidiEvent>> {
        self.events
            .get(method)
            .map(|decoder| decoder(self, params))
    }

    /// Returns every event method with a registered decoder.
    pub fn event_methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.events.keys().copied()
    }
}

// ============================================================================
// Error Classification
// ============================================================================

/// Maps a serde failure onto the crate's decode error taxonomy.
fn classify(err: &serde_json::Error, type_name: &str) -> Error {
    let message = err.to_string();

    if let Some((value, rest)) = backticked(&message, UNKNOWN_VALUE_PREFIX) {
        let enum_name = rest
            .strip_prefix(" for ")
            .and_then(|tail| tail.split_whitespace().next())
            .unwrap_or(type_name);
        return Error::unknown_enum_value(enum_name, value);
    }

    if let Some((discriminant, _)) = backticked(&message, UNKNOWN_VARIANT_PREFIX) {
        return Error::unknown_variant(type_name, discriminant);
    }

    Error::decode(type_name, message)
}

/// Splits `"<prefix><quoted>`<rest>"` into `(quoted, rest)`.
fn backticked<'a>(message: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    message.strip_prefix(prefix)?.split_once('`')
}

/// Type name with module paths stripped (`Vec<Info>` rather than
/// `alloc::vec::Vec<webdriver_bidi::protocol::browsing_context::Info>`).
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::identifiers::{BrowsingContextId, UserContextId};
    use crate::protocol::browsing_context::{GetTree, ReadinessState};
    use crate::protocol::storage::PartitionDescriptor;

    #[test]
    fn test_partition_descriptor_context_variant() {
        let codec = Codec::new();
        let decoded: PartitionDescriptor = codec
            .decode(json!({ "type": "context", "context": "ctx-1" }))
            .expect("decode");

        assert_eq!(
            decoded,
            PartitionDescriptor::Context {
                context: BrowsingContextId::new("ctx-1")
            }
        );
    }

    #[test]
    fn test_partition_descriptor_unknown_variant() {
        let codec = Codec::new();
        let err = codec
            .decode::<PartitionDescriptor>(json!({ "type": "bogus" }))
            .unwrap_err();

        match err {
            Error::UnknownVariant {
                type_name,
                discriminant,
            } => {
                assert_eq!(type_name, "PartitionDescriptor");
                assert_eq!(discriminant, "bogus");
            }
            other => panic!("expected UnknownVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_wrapper_unknown_value() {
        let codec = Codec::new();
        let err = codec
            .decode::<ReadinessState>(json!("Complete"))
            .unwrap_err();

        match err {
            Error::UnknownEnumValue { type_name, value } => {
                assert_eq!(type_name, "ReadinessState");
                assert_eq!(value, "Complete");
            }
            other => panic!("expected UnknownEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_enum_value_keeps_enum_name() {
        let codec = Codec::new();
        let err = codec
            .decode_str::<Vec<ReadinessState>>(r#"["none", "eventually"]"#)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::UnknownEnumValue { ref type_name, ref value }
                if type_name == "ReadinessState" && value == "eventually"
        ));
    }

    #[test]
    fn test_missing_field_is_decode_error() {
        let codec = Codec::new();
        let err = codec
            .decode::<PartitionDescriptor>(json!({ "type": "context" }))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_encode_command_frame() {
        let codec = Codec::new();
        let command: Command = GetTree::default().into();
        let text = codec
            .encode_command(CommandId::new(7), &command)
            .expect("encode");
        let value: Value = serde_json::from_str(&text).expect("json");

        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "browsingContext.getTree");
        assert_eq!(value["params"], json!({}));
    }

    #[test]
    fn test_decode_message_keeps_id_on_failure() {
        let codec = Codec::new();
        let err = codec
            .decode_message(r#"{"type":"mystery","id":4}"#)
            .unwrap_err();

        assert_eq!(err.id, Some(CommandId::new(4)));
        assert!(matches!(err.error, Error::UnknownVariant { .. }));
    }

    #[test]
    fn test_event_table_is_populated() {
        let codec = Codec::new();
        assert!(codec.has_event_decoder("log.entryAdded"));
        assert!(codec.has_event_decoder("browsingContext.load"));
        assert!(!codec.has_event_decoder("vendor.custom"));
        assert!(codec.decode_event("vendor.custom", json!({})).is_none());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Vec<BrowsingContextId>>(), "Vec<BrowsingContextId>");
        assert_eq!(short_type_name::<PartitionDescriptor>(), "PartitionDescriptor");
    }

    fn contains_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().any(contains_null),
            Value::Object(map) => map.values().any(contains_null),
            _ => false,
        }
    }

    fn partition_strategy() -> impl Strategy<Value = PartitionDescriptor> {
        prop_oneof![
            "[a-z0-9-]{1,12}".prop_map(|c| PartitionDescriptor::Context {
                context: BrowsingContextId::new(c)
            }),
            (
                proptest::option::of("[a-z0-9-]{1,12}"),
                proptest::option::of("https://[a-z]{1,8}\\.test"),
            )
                .prop_map(|(user_context, source_origin)| PartitionDescriptor::StorageKey {
                    user_context: user_context.map(UserContextId::new),
                    source_origin,
                }),
        ]
    }

    proptest! {
        #[test]
        fn prop_partition_descriptor_round_trip(descriptor in partition_strategy()) {
            let codec = Codec::new();
            let encoded = codec.encode(&descriptor).expect("encode");
            prop_assert!(!contains_null(&encoded));
            let decoded: PartitionDescriptor = codec.decode(encoded).expect("decode");
            prop_assert_eq!(decoded, descriptor);
        }

        #[test]
        fn prop_readiness_state_round_trip(index in 0usize..ReadinessState::VARIANTS.len()) {
            let codec = Codec::new();
            let wire = ReadinessState::VARIANTS[index];
            let state = ReadinessState::parse_wire(wire).expect("declared variant");
            let encoded = codec.encode(&state).expect("encode");
            prop_assert_eq!(encoded.as_str(), Some(wire));
            let decoded: ReadinessState = codec.decode(encoded).expect("decode");
            prop_assert_eq!(decoded, state);
        }
    }
}

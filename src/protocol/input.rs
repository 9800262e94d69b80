//! `input` module: synthesized keyboard, pointer and wheel input.
//!
//! Input is described as a list of sources, each with a sequence of
//! actions. The remote end executes tick `n` of every source together.

// ============================================================================
// Imports
// ============================================================================

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::{unknown_value_message, wire_enum};
use crate::identifiers::BrowsingContextId;

use super::script::SharedReference;

// ============================================================================
// Enums
// ============================================================================

wire_enum! {
    /// Pointer device kind.
    pub enum PointerType {
        /// Mouse.
        Mouse => "mouse",
        /// Pen.
        Pen => "pen",
        /// Touch.
        Touch => "touch",
    }
}

// ============================================================================
// Origin
// ============================================================================

/// Coordinate origin of a pointer move or scroll.
///
/// On the wire this is either the string `"viewport"` / `"pointer"` or an
/// element object `{"type":"element","element":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Viewport top-left.
    Viewport,
    /// Current pointer position.
    Pointer,
    /// Center of an element.
    Element(SharedReference),
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Viewport => serializer.serialize_str("viewport"),
            Self::Pointer => serializer.serialize_str("pointer"),
            Self::Element(element) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "element")?;
                map.serialize_entry("element", element)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(name) => match name.as_str() {
                "viewport" => Ok(Self::Viewport),
                "pointer" => Ok(Self::Pointer),
                other => Err(D::Error::custom(unknown_value_message("Origin", other))),
            },
            Value::Object(mut map) => {
                let tag = map
                    .remove("type")
                    .ok_or_else(|| D::Error::missing_field("type"))?;
                match tag.as_str() {
                    Some("element") => {
                        let element = map
                            .remove("element")
                            .ok_or_else(|| D::Error::missing_field("element"))?;
                        SharedReference::deserialize(element)
                            .map(Self::Element)
                            .map_err(D::Error::custom)
                    }
                    Some(other) => Err(D::Error::unknown_variant(other, &["element"])),
                    None => Err(D::Error::custom("origin type must be a string")),
                }
            }
            _ => Err(D::Error::custom("origin must be a string or an object")),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Pointer geometry and pressure shared by pointer down and move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerCommonProperties {
    /// Contact width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Contact height.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Normalized pressure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Barrel pressure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tangential_pressure: Option<f64>,
    /// Rotation in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twist: Option<u32>,
    /// Altitude in radians.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_angle: Option<f64>,
    /// Azimuth in radians.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azimuth_angle: Option<f64>,
}

/// Pointer source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
    /// Device kind; mouse when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer_type: Option<PointerType>,
}

/// Action of a `none` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoneSourceAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
}

/// Action of a `key` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeySourceAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Press a key; `value` is a single grapheme or a key codepoint.
    KeyDown {
        /// Key value.
        value: String,
    },
    /// Release a key.
    KeyUp {
        /// Key value.
        value: String,
    },
}

/// Action of a `pointer` source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerSourceAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Press a button.
    PointerDown {
        /// Button index (0 = primary).
        button: u32,
        /// Geometry.
        #[serde(flatten)]
        properties: PointerCommonProperties,
    },
    /// Release a button.
    PointerUp {
        /// Button index.
        button: u32,
    },
    /// Move the pointer.
    PointerMove {
        /// Target x relative to origin.
        x: f64,
        /// Target y relative to origin.
        y: f64,
        /// Milliseconds the move takes.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
        /// Coordinate origin; viewport when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<Origin>,
        /// Geometry.
        #[serde(flatten)]
        properties: PointerCommonProperties,
    },
}

/// Action of a `wheel` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WheelSourceAction {
    /// Wait.
    Pause {
        /// Milliseconds.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    /// Scroll.
    Scroll {
        /// Start x relative to origin.
        x: i64,
        /// Start y relative to origin.
        y: i64,
        /// Horizontal delta.
        delta_x: i64,
        /// Vertical delta.
        delta_y: i64,
        /// Milliseconds the scroll takes.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
        /// Coordinate origin.
        #[serde(skip_serializing_if = "Option::is_none")]
        origin: Option<Origin>,
    },
}

/// One input source and its action sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceActions {
    /// Timing-only source.
    None {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<NoneSourceAction>,
    },
    /// Keyboard.
    Key {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<KeySourceAction>,
    },
    /// Pointer.
    Pointer {
        /// Source id.
        id: String,
        /// Device parameters.
        #[serde(skip_serializing_if = "Option::is_none")]
        parameters: Option<PointerParameters>,
        /// Actions.
        actions: Vec<PointerSourceAction>,
    },
    /// Wheel.
    Wheel {
        /// Source id.
        id: String,
        /// Actions.
        actions: Vec<WheelSourceAction>,
    },
}

impl SourceActions {
    /// Returns the source id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::None { id, .. }
            | Self::Key { id, .. }
            | Self::Pointer { id, .. }
            | Self::Wheel { id, .. } => id,
        }
    }

    /// Returns the number of actions (ticks) in this source.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None { actions, .. } => actions.len(),
            Self::Key { actions, .. } => actions.len(),
            Self::Pointer { actions, .. } => actions.len(),
            Self::Wheel { actions, .. } => actions.len(),
        }
    }

    /// Returns `true` if the source has no actions.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Commands
// ============================================================================

/// `input.performActions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformActions {
    /// Target context.
    pub context: BrowsingContextId,
    /// Sources.
    pub actions: Vec<SourceActions>,
}

/// `input.releaseActions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseActions {
    /// Target context.
    pub context: BrowsingContextId,
}

/// `input.setFiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetFiles {
    /// Target context.
    pub context: BrowsingContextId,
    /// `<input type=file>` element.
    pub element: SharedReference,
    /// Absolute file paths on the remote end.
    pub files: Vec<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::testing::{assert_round_trip, assert_unknown_variant};

    #[test]
    fn test_origin_string_forms() {
        assert_eq!(serde_json::to_value(Origin::Viewport).expect("encode"), json!("viewport"));
        let pointer: Origin = serde_json::from_value(json!("pointer")).expect("decode");
        assert_eq!(pointer, Origin::Pointer);
    }

    #[test]
    fn test_origin_element_form() {
        let origin = Origin::Element(SharedReference::new("n-1"));
        let encoded = serde_json::to_value(&origin).expect("encode");
        assert_eq!(
            encoded,
            json!({ "type": "element", "element": { "sharedId": "n-1" } })
        );
        let decoded: Origin = serde_json::from_value(encoded).expect("decode");
        assert_eq!(decoded, origin);
    }

    #[test]
    fn test_origin_rejects_unknown_name() {
        let err = serde_json::from_value::<Origin>(json!("document")).unwrap_err();
        assert!(err.to_string().starts_with("unknown value `document` for Origin"));
    }

    #[test]
    fn test_pointer_move_splices_properties() {
        let source = SourceActions::Pointer {
            id: "mouse".into(),
            parameters: Some(PointerParameters {
                pointer_type: Some(PointerType::Mouse),
            }),
            actions: vec![PointerSourceAction::PointerMove {
                x: 10.0,
                y: 20.0,
                duration: None,
                origin: None,
                properties: PointerCommonProperties {
                    pressure: Some(0.5),
                    ..Default::default()
                },
            }],
        };

        assert_eq!(
            serde_json::to_value(&source).expect("encode"),
            json!({
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [{ "type": "pointerMove", "x": 10.0, "y": 20.0, "pressure": 0.5 }]
            })
        );
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_key_actions() {
        let source = SourceActions::Key {
            id: "kbd".into(),
            actions: vec![
                KeySourceAction::KeyDown { value: "a".into() },
                KeySourceAction::KeyUp { value: "a".into() },
            ],
        };
        let encoded = serde_json::to_value(&source).expect("encode");
        assert_eq!(encoded["actions"][0], json!({ "type": "keyDown", "value": "a" }));
        assert_eq!(source.id(), "kbd");
    }

    #[test]
    fn test_every_source_round_trips() {
        let sources = vec![
            SourceActions::None {
                id: "tick".into(),
                actions: vec![NoneSourceAction::Pause { duration: Some(50) }],
            },
            SourceActions::Pointer {
                id: "pen".into(),
                parameters: Some(PointerParameters {
                    pointer_type: Some(PointerType::Pen),
                }),
                actions: vec![
                    PointerSourceAction::PointerMove {
                        x: 12.5,
                        y: -3.0,
                        duration: Some(100),
                        origin: Some(Origin::Element(SharedReference::new("n-1"))),
                        properties: PointerCommonProperties::default(),
                    },
                    PointerSourceAction::PointerDown {
                        button: 0,
                        properties: PointerCommonProperties {
                            width: Some(2),
                            pressure: Some(0.75),
                            twist: Some(90),
                            ..Default::default()
                        },
                    },
                    PointerSourceAction::Pause { duration: None },
                    PointerSourceAction::PointerUp { button: 0 },
                ],
            },
            SourceActions::Wheel {
                id: "wheel".into(),
                actions: vec![WheelSourceAction::Scroll {
                    x: 0,
                    y: 0,
                    delta_x: 0,
                    delta_y: 240,
                    duration: None,
                    origin: Some(Origin::Viewport),
                }],
            },
        ];

        let encoded = assert_round_trip(&sources);
        assert_eq!(encoded[1]["actions"][1]["pressure"], json!(0.75));
        assert_eq!(encoded[2]["actions"][0]["deltaY"], json!(240));
    }

    #[test]
    fn test_unknown_action_types_are_rejected() {
        assert_unknown_variant::<SourceActions>(
            json!({ "type": "gamepad", "id": "g", "actions": [] }),
            "gamepad",
        );
        assert_unknown_variant::<NoneSourceAction>(json!({ "type": "keyDown" }), "keyDown");
        assert_unknown_variant::<KeySourceAction>(
            json!({ "type": "keyPress", "value": "a" }),
            "keyPress",
        );
        assert_unknown_variant::<PointerSourceAction>(
            json!({ "type": "pointerCancel" }),
            "pointerCancel",
        );
        assert_unknown_variant::<WheelSourceAction>(json!({ "type": "swipe" }), "swipe");
    }

    fn key_action_strategy() -> impl Strategy<Value = KeySourceAction> {
        prop_oneof![
            proptest::option::of(0u64..10_000)
                .prop_map(|duration| KeySourceAction::Pause { duration }),
            "[a-zA-Z0-9]|\u{E007}".prop_map(|value| KeySourceAction::KeyDown { value }),
            "[a-zA-Z0-9]".prop_map(|value| KeySourceAction::KeyUp { value }),
        ]
    }

    fn wheel_action_strategy() -> impl Strategy<Value = WheelSourceAction> {
        (
            -2000i64..2000,
            -2000i64..2000,
            -500i64..500,
            -500i64..500,
            proptest::option::of(0u64..1000),
            prop_oneof![Just(None), Just(Some(Origin::Viewport)), Just(Some(Origin::Pointer))],
        )
            .prop_map(|(x, y, delta_x, delta_y, duration, origin)| {
                WheelSourceAction::Scroll {
                    x,
                    y,
                    delta_x,
                    delta_y,
                    duration,
                    origin,
                }
            })
    }

    proptest! {
        #[test]
        fn prop_key_source_round_trip(
            id in "[a-z]{1,8}",
            actions in proptest::collection::vec(key_action_strategy(), 0..8),
        ) {
            assert_round_trip(&SourceActions::Key { id, actions });
        }

        #[test]
        fn prop_wheel_source_round_trip(
            actions in proptest::collection::vec(wheel_action_strategy(), 0..4),
        ) {
            assert_round_trip(&SourceActions::Wheel { id: "wheel".into(), actions });
        }
    }
}

//! `input` commands: action sequences and file inputs.
//!
//! Besides the raw commands, [`InputManager`] builds the common sequences:
//! typing text, pressing one key and clicking at a point.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::identifiers::BrowsingContextId;
use crate::protocol::input::{
    KeySourceAction, Origin, PerformActions, PointerCommonProperties, PointerParameters,
    PointerSourceAction, PointerType, ReleaseActions, SetFiles, SourceActions,
};
use crate::protocol::script::SharedReference;
use crate::session::Session;

use super::require_non_empty;

// ============================================================================
// Constants
// ============================================================================

/// Source id used for keyboard sequences built here.
const KEYBOARD_SOURCE: &str = "keyboard";

/// Source id used for pointer sequences built here.
const MOUSE_SOURCE: &str = "mouse";

/// Primary mouse button.
const PRIMARY_BUTTON: u32 = 0;

// ============================================================================
// InputManager
// ============================================================================

/// Commands of the `input` module.
#[derive(Debug, Clone)]
pub struct InputManager {
    session: Session,
}

impl InputManager {
    /// Creates a manager sending through `session`.
    #[inline]
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Runs action sequences, one tick at a time across sources.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty source list, an empty or
    ///   duplicate source id, an empty key value or a pointer pressure
    ///   outside `0.0..=1.0`
    /// - session and protocol errors
    pub async fn perform_actions(
        &self,
        context: &BrowsingContextId,
        actions: Vec<SourceActions>,
    ) -> Result<()> {
        validate_actions(&actions)?;

        self.session
            .send(PerformActions {
                context: context.clone(),
                actions,
            })
            .await?;
        Ok(())
    }

    /// Releases every pressed key and button.
    ///
    /// # Errors
    ///
    /// Session and protocol errors.
    pub async fn release_actions(&self, context: &BrowsingContextId) -> Result<()> {
        self.session
            .send(ReleaseActions {
                context: context.clone(),
            })
            .await?;
        Ok(())
    }

    /// Populates an `<input type=file>`. An empty list clears it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for an empty path
    /// - session and protocol errors
    pub async fn set_files(
        &self,
        context: &BrowsingContextId,
        element: SharedReference,
        files: Vec<String>,
    ) -> Result<()> {
        for file in &files {
            require_non_empty("file path", file)?;
        }

        self.session
            .send(SetFiles {
                context: context.clone(),
                element,
                files,
            })
            .await?;
        Ok(())
    }

    /// Types `text` one character at a time.
    ///
    /// # Errors
    ///
    /// Same as [`Self::perform_actions`]; empty text is rejected.
    pub async fn type_text(&self, context: &BrowsingContextId, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(Error::invalid_argument("text must not be empty"));
        }
        self.perform_actions(context, vec![type_text_actions(text)])
            .await
    }

    /// Presses and releases one key value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::perform_actions`].
    pub async fn press_key(&self, context: &BrowsingContextId, value: &str) -> Result<()> {
        self.perform_actions(context, vec![press_key_actions(value)])
            .await
    }

    /// Clicks the primary button at a point relative to `origin`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::perform_actions`].
    pub async fn click_at(
        &self,
        context: &BrowsingContextId,
        x: f64,
        y: f64,
        origin: Option<Origin>,
    ) -> Result<()> {
        self.perform_actions(context, vec![click_actions(x, y, origin)])
            .await
    }
}

// ============================================================================
// Sequence Builders
// ============================================================================

/// Key source typing `text`: a down/up pair per character.
#[must_use]
pub fn type_text_actions(text: &str) -> SourceActions {
    let actions = text
        .chars()
        .flat_map(|c| {
            let value = c.to_string();
            [
                KeySourceAction::KeyDown {
                    value: value.clone(),
                },
                KeySourceAction::KeyUp { value },
            ]
        })
        .collect();

    SourceActions::Key {
        id: KEYBOARD_SOURCE.to_string(),
        actions,
    }
}

/// Key source pressing one key value.
#[must_use]
pub fn press_key_actions(value: &str) -> SourceActions {
    SourceActions::Key {
        id: KEYBOARD_SOURCE.to_string(),
        actions: vec![
            KeySourceAction::KeyDown {
                value: value.to_string(),
            },
            KeySourceAction::KeyUp {
                value: value.to_string(),
            },
        ],
    }
}

/// Mouse source moving to a point and clicking the primary button.
#[must_use]
pub fn click_actions(x: f64, y: f64, origin: Option<Origin>) -> SourceActions {
    SourceActions::Pointer {
        id: MOUSE_SOURCE.to_string(),
        parameters: Some(PointerParameters {
            pointer_type: Some(PointerType::Mouse),
        }),
        actions: vec![
            PointerSourceAction::PointerMove {
                x,
                y,
                duration: None,
                origin,
                properties: PointerCommonProperties::default(),
            },
            PointerSourceAction::PointerDown {
                button: PRIMARY_BUTTON,
                properties: PointerCommonProperties::default(),
            },
            PointerSourceAction::PointerUp {
                button: PRIMARY_BUTTON,
            },
        ],
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_actions(actions: &[SourceActions]) -> Result<()> {
    if actions.is_empty() {
        return Err(Error::invalid_argument("action source list is empty"));
    }

    let mut seen = FxHashSet::default();
    for source in actions {
        require_non_empty("action source id", source.id())?;
        if !seen.insert(source.id()) {
            return Err(Error::invalid_argument(format!(
                "duplicate action source id {:?}",
                source.id()
            )));
        }

        match source {
            SourceActions::Key { actions, .. } => {
                for action in actions {
                    if let KeySourceAction::KeyDown { value } | KeySourceAction::KeyUp { value } =
                        action
                        && value.is_empty()
                    {
                        return Err(Error::invalid_argument("key value must not be empty"));
                    }
                }
            }
            SourceActions::Pointer { actions, .. } => {
                for action in actions {
                    let properties = match action {
                        PointerSourceAction::PointerDown { properties, .. }
                        | PointerSourceAction::PointerMove { properties, .. } => properties,
                        _ => continue,
                    };
                    if let Some(pressure) = properties.pressure
                        && !(0.0..=1.0).contains(&pressure)
                    {
                        return Err(Error::invalid_argument(
                            "pointer pressure must be within 0..=1",
                        ));
                    }
                }
            }
            SourceActions::None { .. } | SourceActions::Wheel { .. } => {}
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

//! Special key values for `input.performActions`.
//!
//! Key actions carry a single grapheme. Printable keys are the character
//! itself; control keys use the WebDriver private-use codepoints.
//!
//! # Example
//!
//! ```
//! use webdriver_bidi::Key;
//!
//! assert_eq!(Key::Enter.value(), "\u{E007}");
//! assert_eq!(Key::Space.value(), " ");
//! ```

use std::fmt;

// ============================================================================
// Key Enum
// ============================================================================

/// Common navigation and control keys.
///
/// For text, use [`crate::BidiClient::type_text`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // ========================================================================
    // Navigation & Control
    // ========================================================================
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Space bar
    Space,

    // ========================================================================
    // Modifiers
    // ========================================================================
    /// Left Shift
    Shift,
    /// Left Control
    Control,
    /// Left Alt
    Alt,
    /// Left Meta
    Meta,

    // ========================================================================
    // Arrow Keys
    // ========================================================================
    /// Arrow Up
    ArrowUp,
    /// Arrow Down
    ArrowDown,
    /// Arrow Left
    ArrowLeft,
    /// Arrow Right
    ArrowRight,

    // ========================================================================
    // Page Navigation
    // ========================================================================
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
}

impl Key {
    /// Returns the key properties: (value, DOM key name, printable).
    #[must_use]
    pub fn properties(self) -> (&'static str, &'static str, bool) {
        match self {
            Key::Enter => ("\u{E007}", "Enter", false),
            Key::Tab => ("\u{E004}", "Tab", false),
            Key::Escape => ("\u{E00C}", "Escape", false),
            Key::Backspace => ("\u{E003}", "Backspace", false),
            Key::Delete => ("\u{E017}", "Delete", false),
            Key::Space => (" ", " ", true),
            Key::Shift => ("\u{E008}", "Shift", false),
            Key::Control => ("\u{E009}", "Control", false),
            Key::Alt => ("\u{E00A}", "Alt", false),
            Key::Meta => ("\u{E03D}", "Meta", false),
            Key::ArrowUp => ("\u{E013}", "ArrowUp", false),
            Key::ArrowDown => ("\u{E015}", "ArrowDown", false),
            Key::ArrowLeft => ("\u{E012}", "ArrowLeft", false),
            Key::ArrowRight => ("\u{E014}", "ArrowRight", false),
            Key::Home => ("\u{E011}", "Home", false),
            Key::End => ("\u{E010}", "End", false),
            Key::PageUp => ("\u{E00E}", "PageUp", false),
            Key::PageDown => ("\u{E00F}", "PageDown", false),
        }
    }

    /// Returns the value sent in `keyDown`/`keyUp`.
    #[inline]
    #[must_use]
    pub fn value(self) -> &'static str {
        self.properties().0
    }

    /// Returns the DOM `KeyboardEvent.key` the page observes.
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        self.properties().1
    }

    /// Returns whether this key produces printable output.
    #[inline]
    #[must_use]
    pub fn is_printable(self) -> bool {
        self.properties().2
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_properties() {
        let (value, name, printable) = Key::Enter.properties();
        assert_eq!(value, "\u{E007}");
        assert_eq!(name, "Enter");
        assert!(!printable);
    }

    #[test]
    fn test_space_is_printable() {
        assert!(Key::Space.is_printable());
        assert!(!Key::Tab.is_printable());
    }

    #[test]
    fn test_values_are_single_codepoints() {
        for key in [Key::Escape, Key::ArrowLeft, Key::PageDown, Key::Meta] {
            assert_eq!(key.value().chars().count(), 1, "{key}");
        }
    }
}

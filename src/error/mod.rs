//! Error handling for the stanza registry.

use std::fmt;

/// Errors raised by registry and document operations
///
/// Field access never produces one of these: malformed attribute or text
/// content falls back to the field's declared default instead.
#[derive(Debug, thiserror::Error)]
pub enum StanzaError {
    /// Input text could not be turned into a document root element
    #[error("Parse error: {reason} (input: {text:?})")]
    Parse {
        /// The offending input text
        text: String,
        /// What the document collaborator reported
        reason: String,
    },

    /// A schema was required for a qualified name but none is registered
    #[error("Could not find definition for <{element} xmlns=\"{namespace}\" />")]
    MissingDefinition {
        /// Local element name that was looked up
        element: String,
        /// Namespace that was looked up
        namespace: String,
    },
}

impl StanzaError {
    /// Create a parse error for `text` with the given reason
    pub fn parse(text: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Parse {
            text: text.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing definition error
    pub fn missing_definition(element: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::MissingDefinition {
            element: element.into(),
            namespace: namespace.into(),
        }
    }

    /// Whether this error came from malformed input text
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type for stanza operations
pub type Result<T> = std::result::Result<T, StanzaError>;

//! Errors raised when reading model values from text.

/// Failure to parse a status or kind from its textual form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text does not name any known variant
    #[error("unknown {kind} '{value}'")]
    UnknownVariant {
        /// What was being parsed (e.g. "lesson status")
        kind: &'static str,
        /// The rejected input
        value: String,
    },
}

impl ParseError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}

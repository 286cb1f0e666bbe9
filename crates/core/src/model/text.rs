use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("text cannot be empty")]
    Empty,
}

/// Card-facing text (question or answer), guaranteed non-blank.
///
/// Leading and trailing whitespace is preserved; only fully blank input is
/// rejected. The deck store validates text before a card can enter a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardText(String);

impl CardText {
    /// Parse card text, rejecting input that is empty after trimming.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input contains no visible characters.
    pub fn parse(value: impl Into<String>) -> Result<Self, TextError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CardText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(CardText::parse("   "), Err(TextError::Empty)));
        assert!(matches!(CardText::parse(""), Err(TextError::Empty)));
    }

    #[test]
    fn visible_text_is_kept_verbatim() {
        let text = CardText::parse(" 2+2 ").unwrap();
        assert_eq!(text.as_str(), " 2+2 ");
    }
}

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::model::tag::TagName;
use crate::model::text::{CardText, TextError};

//
// ─── CARD TYPES ────────────────────────────────────────────────────────────────
//

/// Opaque reference to an image asset held by the external image store.
///
/// The study engine never dereferences these; it only carries them alongside
/// the card so a presentation layer can resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef(String);

impl ImageRef {
    /// Create an image reference from an opaque identifier.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyImageRef` if the identifier is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, CardError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CardError::EmptyImageRef);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An immutable question/answer record owned by the external deck store.
///
/// Question and answer are non-empty by construction; the engine receives
/// cards read-only and never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    question: CardText,
    answer: CardText,
    tags: BTreeSet<TagName>,
    image_refs: Vec<ImageRef>,
}

impl Card {
    #[must_use]
    pub fn new(question: CardText, answer: CardText) -> Self {
        Self {
            question,
            answer,
            tags: BTreeSet::new(),
            image_refs: Vec::new(),
        }
    }

    /// Convenience constructor from raw text.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyQuestion` or `CardError::EmptyAnswer` when the
    /// respective side is blank.
    pub fn parse(
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Self, CardError> {
        let question = CardText::parse(question).map_err(CardError::EmptyQuestion)?;
        let answer = CardText::parse(answer).map_err(CardError::EmptyAnswer)?;
        Ok(Self::new(question, answer))
    }

    /// Attach tags to the card.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagName>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Attach image references to the card.
    #[must_use]
    pub fn with_image_refs(mut self, refs: impl IntoIterator<Item = ImageRef>) -> Self {
        self.image_refs = refs.into_iter().collect();
        self
    }

    #[must_use]
    pub fn question(&self) -> &CardText {
        &self.question
    }

    #[must_use]
    pub fn answer(&self) -> &CardText {
        &self.answer
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<TagName> {
        &self.tags
    }

    #[must_use]
    pub fn image_refs(&self) -> &[ImageRef] {
        &self.image_refs
    }
}

//
// ─── CARD ERRORS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("invalid question text: {0}")]
    EmptyQuestion(#[source] TextError),

    #[error("invalid answer text: {0}")]
    EmptyAnswer(#[source] TextError),

    #[error("image reference cannot be empty")]
    EmptyImageRef,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

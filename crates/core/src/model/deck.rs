use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::card::Card;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

//
// ─── DECK NAME ─────────────────────────────────────────────────────────────────
//

/// Validated deck name (trimmed, non-empty).
///
/// Deck names identify decks across the deck store and in session summaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeckName(String);

impl DeckName {
    /// Create a validated deck name.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, DeckError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DeckError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named, ordered collection of cards.
///
/// Decks are owned by the external deck store; the study engine only ever
/// sees a deck's card list. Card order is significant: a card's position in
/// the deck is its identity for mastery bookkeeping during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    name: DeckName,
    cards: Vec<Card>,
    created_at: DateTime<Utc>,
}

impl Deck {
    #[must_use]
    pub fn new(name: DeckName, cards: Vec<Card>, created_at: DateTime<Utc>) -> Self {
        Self {
            name,
            cards,
            created_at,
        }
    }

    #[must_use]
    pub fn name(&self) -> &DeckName {
        &self.name
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn deck_name_is_trimmed() {
        let name = DeckName::new("  Spanish Vocab ").unwrap();
        assert_eq!(name.as_str(), "Spanish Vocab");
    }

    #[test]
    fn blank_deck_name_is_rejected() {
        assert!(matches!(DeckName::new("   "), Err(DeckError::EmptyName)));
    }

    #[test]
    fn deck_preserves_card_order() {
        let cards = vec![
            Card::parse("Q1", "A1").unwrap(),
            Card::parse("Q2", "A2").unwrap(),
        ];
        let deck = Deck::new(DeckName::new("Test").unwrap(), cards, fixed_now());

        assert_eq!(deck.card_count(), 2);
        assert_eq!(deck.cards()[0].question().as_str(), "Q1");
        assert_eq!(deck.cards()[1].question().as_str(), "Q2");
    }
}

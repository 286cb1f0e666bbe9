use async_trait::async_trait;
use recall_core::model::{Card, Deck, DeckName, SessionSummary};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted session summary.
///
/// NOTE: This is `i64` so disk-backed adapters can map it onto row IDs.
pub type HistoryId = i64;

/// A persisted summary together with its storage identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHistoryRow {
    pub id: HistoryId,
    pub summary: SessionSummary,
}

impl SessionHistoryRow {
    #[must_use]
    pub fn new(id: HistoryId, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

/// Read-only card supply from the deck store.
///
/// The study engine consumes ordered card lists through this boundary and
/// never writes back; deck CRUD lives entirely behind it.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetch the ordered card list for a single deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown deck, or other storage
    /// errors.
    async fn deck_cards(&self, name: &DeckName) -> Result<Vec<Card>, StorageError>;

    /// Fetch cards pooled across all decks, in deck order then card order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be assembled.
    async fn pooled_cards(&self) -> Result<Vec<Card>, StorageError>;
}

/// Append-only session history.
///
/// Summaries are immutable once appended; the engine writes each one exactly
/// once at session completion.
#[async_trait]
pub trait SessionHistoryRepository: Send + Sync {
    /// Append a summary and return its storage identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<HistoryId, StorageError>;

    /// Fetch a summary by identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_summary(&self, id: HistoryId) -> Result<SessionSummary, StorageError>;

    /// List the most recent summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_recent(&self, limit: u32) -> Result<Vec<SessionHistoryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Decks are keyed by name in sorted order, so the pooled card list has a
/// stable deck iteration order.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    decks: Arc<Mutex<BTreeMap<DeckName, Deck>>>,
    summaries: Arc<Mutex<Vec<SessionSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            decks: Arc::new(Mutex::new(BTreeMap::new())),
            summaries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Insert or replace a deck. Test and prototyping seam; deck CRUD is not
    /// part of the engine's contract.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_deck(&self, deck: Deck) -> Result<(), StorageError> {
        let mut guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(deck.name().clone(), deck);
        Ok(())
    }
}

#[async_trait]
impl CardSource for InMemoryRepository {
    async fn deck_cards(&self, name: &DeckName) -> Result<Vec<Card>, StorageError> {
        let guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(name)
            .map(|deck| deck.cards().to_vec())
            .ok_or(StorageError::NotFound)
    }

    async fn pooled_cards(&self) -> Result<Vec<Card>, StorageError> {
        let guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .flat_map(|deck| deck.cards().iter().cloned())
            .collect())
    }
}

#[async_trait]
impl SessionHistoryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<HistoryId, StorageError> {
        let mut guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(summary.clone());
        i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("history id overflow".into()))
    }

    async fn get_summary(&self, id: HistoryId) -> Result<SessionSummary, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let index = usize::try_from(id.checked_sub(1).ok_or(StorageError::NotFound)?)
            .map_err(|_| StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<SessionHistoryRow>, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .enumerate()
            .rev()
            .take(limit as usize)
            .map(|(index, summary)| SessionHistoryRow::new(index as i64 + 1, summary.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::{Card, DeckName, SessionSummary};
    use recall_core::time::fixed_now;

    fn build_deck(name: &str, questions: &[&str]) -> Deck {
        let cards = questions
            .iter()
            .map(|q| Card::parse(*q, "A").unwrap())
            .collect();
        Deck::new(DeckName::new(name).unwrap(), cards, fixed_now())
    }

    fn build_summary(deck: &str, studied: u32, mastered: u32) -> SessionSummary {
        SessionSummary::new(
            Some(DeckName::new(deck).unwrap()),
            studied,
            mastered,
            fixed_now(),
            fixed_now() + chrono::Duration::seconds(60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn deck_cards_returns_cards_in_order() {
        let repo = InMemoryRepository::new();
        repo.insert_deck(build_deck("Math", &["Q1", "Q2", "Q3"]))
            .unwrap();

        let cards = repo
            .deck_cards(&DeckName::new("Math").unwrap())
            .await
            .unwrap();

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].question().as_str(), "Q1");
        assert_eq!(cards[2].question().as_str(), "Q3");
    }

    #[tokio::test]
    async fn unknown_deck_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .deck_cards(&DeckName::new("Missing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn pooled_cards_follow_deck_name_order() {
        let repo = InMemoryRepository::new();
        repo.insert_deck(build_deck("Zoology", &["Z1"])).unwrap();
        repo.insert_deck(build_deck("Algebra", &["A1", "A2"])).unwrap();

        let pool = repo.pooled_cards().await.unwrap();

        assert_eq!(pool.len(), 3);
        assert_eq!(pool[0].question().as_str(), "A1");
        assert_eq!(pool[1].question().as_str(), "A2");
        assert_eq!(pool[2].question().as_str(), "Z1");
    }

    #[tokio::test]
    async fn summaries_append_and_fetch_round_trip() {
        let repo = InMemoryRepository::new();
        let first = repo.append_summary(&build_summary("Math", 3, 2)).await.unwrap();
        let second = repo.append_summary(&build_summary("Math", 5, 5)).await.unwrap();

        assert_ne!(first, second);
        let fetched = repo.get_summary(second).await.unwrap();
        assert_eq!(fetched.cards_studied(), 5);

        let err = repo.get_summary(99).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let repo = InMemoryRepository::new();
        for studied in 1..=4 {
            repo.append_summary(&build_summary("Math", studied, 0))
                .await
                .unwrap();
        }

        let rows = repo.list_recent(2).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].summary.cards_studied(), 4);
        assert_eq!(rows[1].summary.cards_studied(), 3);
        assert!(rows[0].id > rows[1].id);
    }
}

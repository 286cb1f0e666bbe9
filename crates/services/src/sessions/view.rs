use chrono::{DateTime, Utc};
use std::sync::Arc;

use recall_core::model::{DeckName, SessionSummary};
use storage::repository::{HistoryId, SessionHistoryRepository, SessionHistoryRow};

use crate::Clock;
use crate::error::SessionError;

/// Presentation-agnostic list item for a past study session.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no localization assumptions
///
/// The UI may format timestamps, accuracy, and durations as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionHistoryListItem {
    pub id: HistoryId,
    pub deck: Option<DeckName>,
    pub cards_studied: u32,
    pub cards_mastered: u32,
    pub accuracy: f64,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

impl SessionHistoryListItem {
    #[must_use]
    pub fn from_summary(id: HistoryId, summary: &SessionSummary) -> Self {
        Self {
            id,
            deck: summary.deck().cloned(),
            cards_studied: summary.cards_studied(),
            cards_mastered: summary.cards_mastered(),
            accuracy: summary.accuracy(),
            duration_seconds: summary.duration_seconds(),
            completed_at: summary.completed_at(),
        }
    }

    #[must_use]
    pub fn from_row(row: &SessionHistoryRow) -> Self {
        Self::from_summary(row.id, &row.summary)
    }
}

/// Read side of the session history, hiding repositories and time from the
/// presentation layer.
#[derive(Clone)]
pub struct SessionHistoryService {
    clock: Clock,
    history: Arc<dyn SessionHistoryRepository>,
}

impl SessionHistoryService {
    #[must_use]
    pub fn new(clock: Clock, history: Arc<dyn SessionHistoryRepository>) -> Self {
        Self { clock, history }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load the most recent session summaries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        limit: u32,
    ) -> Result<Vec<SessionHistoryListItem>, SessionError> {
        let rows = self.history.list_recent(limit).await?;
        Ok(rows.iter().map(SessionHistoryListItem::from_row).collect())
    }

    /// Fetch a session summary by ID.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails.
    pub async fn get(&self, id: HistoryId) -> Result<SessionSummary, SessionError> {
        Ok(self.history.get_summary(id).await?)
    }
}

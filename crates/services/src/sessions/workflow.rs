use std::sync::Arc;

use recall_core::model::DeckName;
use storage::repository::{CardSource, HistoryId, SessionHistoryRepository};

use super::queue::{QueueBuilder, StudyMode};
use super::state::StudySession;
use crate::Clock;
use crate::error::SessionError;

/// Result of one completion-capable step in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStepResult {
    pub is_complete: bool,
    pub history_id: Option<HistoryId>,
}

/// Orchestrates session start, grading, and summary persistence.
///
/// The state machine itself never touches storage; this service supplies it
/// with clock time and deck-store card lists, and appends the summary to the
/// history exactly once when a session completes.
#[derive(Clone)]
pub struct StudyLoopService {
    clock: Clock,
    cards: Arc<dyn CardSource>,
    history: Arc<dyn SessionHistoryRepository>,
    mode: StudyMode,
}

impl StudyLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        cards: Arc<dyn CardSource>,
        history: Arc<dyn SessionHistoryRepository>,
    ) -> Self {
        Self {
            clock,
            cards,
            history,
            mode: StudyMode::Sequential,
        }
    }

    /// Set the queue ordering policy for sessions started by this service.
    #[must_use]
    pub fn with_mode(mut self, mode: StudyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Start a new session for the given deck.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for deck-store failures and
    /// `SessionError::Empty` for decks without cards.
    pub async fn start_session(&self, deck: &DeckName) -> Result<StudySession, SessionError> {
        let cards = self.cards.deck_cards(deck).await?;
        let queue = QueueBuilder::new(self.mode).build(cards)?;
        StudySession::new(Some(deck.clone()), queue, self.clock.now())
    }

    /// Start a pooled session over the cards of every deck.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` for deck-store failures and
    /// `SessionError::Empty` when no cards exist at all.
    pub async fn start_session_all_decks(&self) -> Result<StudySession, SessionError> {
        let cards = self.cards.pooled_cards().await?;
        let queue = QueueBuilder::new(self.mode).build(cards)?;
        StudySession::new(None, queue, self.clock.now())
    }

    /// Grade the current card as known and persist the summary if the session
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` on a finished session and
    /// `SessionError::Storage` if the summary append fails.
    pub async fn grade_known(
        &self,
        session: &mut StudySession,
    ) -> Result<SessionStepResult, SessionError> {
        session.grade_known(self.clock.now())?;
        self.finalize_if_complete(session).await
    }

    /// Grade the current card as needing more study and persist the summary
    /// if the session completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` on a finished session and
    /// `SessionError::Storage` if the summary append fails.
    pub async fn grade_needs_more_study(
        &self,
        session: &mut StudySession,
    ) -> Result<SessionStepResult, SessionError> {
        session.grade_needs_more_study(self.clock.now())?;
        self.finalize_if_complete(session).await
    }

    /// Advance past the current card and persist the summary if the session
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` on a finished session and
    /// `SessionError::Storage` if the summary append fails.
    pub async fn advance(
        &self,
        session: &mut StudySession,
    ) -> Result<SessionStepResult, SessionError> {
        session.advance(self.clock.now())?;
        self.finalize_if_complete(session).await
    }

    /// End the session now and persist its summary.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the summary append fails.
    pub async fn end_session(
        &self,
        session: &mut StudySession,
    ) -> Result<SessionStepResult, SessionError> {
        session.end(self.clock.now());
        self.finalize_if_complete(session).await
    }

    /// Retry summary persistence for a completed session.
    ///
    /// Useful when the final append failed (e.g. transient storage error).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is still active and
    /// `SessionError::Storage` if persistence fails again.
    pub async fn finalize_summary(
        &self,
        session: &mut StudySession,
    ) -> Result<HistoryId, SessionError> {
        if let Some(id) = session.history_id() {
            return Ok(id);
        }

        if !session.is_complete() {
            return Err(SessionError::Completed);
        }

        let summary = session.build_summary()?;
        let id = self.history.append_summary(&summary).await?;
        session.set_history_id(id);
        Ok(id)
    }

    async fn finalize_if_complete(
        &self,
        session: &mut StudySession,
    ) -> Result<SessionStepResult, SessionError> {
        if session.is_complete() && session.history_id().is_none() {
            let summary = session.build_summary()?;
            let id = self.history.append_summary(&summary).await?;
            session.set_history_id(id);
        }

        Ok(SessionStepResult {
            is_complete: session.is_complete(),
            history_id: session.history_id(),
        })
    }
}

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use recall_core::model::{DeckName, SessionSummary};

use super::progress::SessionProgress;
use super::queue::QueueEntry;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one study session.
///
/// Owns the live review queue and steps through it in response to reveal,
/// grade, and navigation actions. Cards graded as known are removed from the
/// queue; cards needing more study are re-queued at the tail as duplicates.
/// The session is complete when the cursor passes the end of the queue or
/// when it is ended explicitly.
///
/// Exactly one caller drives a session at a time; every operation applies its
/// mutation fully or rejects without touching the queue.
pub struct StudySession {
    deck: Option<DeckName>,
    queue: Vec<QueueEntry>,
    position: usize,
    revealed: bool,
    mastered: BTreeSet<usize>,
    studied: BTreeSet<usize>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    // NOTE: i64 to match storage row IDs.
    history_id: Option<i64>,
    duplicates_spawned: u64,
}

impl StudySession {
    /// Create a session over a prepared queue.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the queue has no entries.
    pub fn new(
        deck: Option<DeckName>,
        queue: Vec<QueueEntry>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if queue.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            deck,
            queue,
            position: 0,
            revealed: false,
            mastered: BTreeSet::new(),
            studied: BTreeSet::new(),
            started_at,
            completed_at: None,
            history_id: None,
            duplicates_spawned: 0,
        })
    }

    #[must_use]
    pub fn deck(&self) -> Option<&DeckName> {
        self.deck.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn history_id(&self) -> Option<i64> {
        self.history_id
    }

    /// Number of entries currently in the queue, duplicates included.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Cursor into the queue; equals `queue_len` once the end is reached.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Original deck indices graded as known at least once this session.
    ///
    /// Membership is monotonic: once a card is mastered it stays mastered for
    /// the rest of the session, even if a duplicate of it is graded again.
    #[must_use]
    pub fn mastered_source_indices(&self) -> &BTreeSet<usize> {
        &self.mastered
    }

    #[must_use]
    pub fn mastered_count(&self) -> usize {
        self.mastered.len()
    }

    /// Distinct original cards the user took at least one grading or advance
    /// step on.
    #[must_use]
    pub fn studied_count(&self) -> usize {
        self.studied.len()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.queue.len(),
            position: self.position,
            remaining: self.queue.len().saturating_sub(self.position),
            revealed: self.revealed,
            is_complete: self.is_complete(),
        }
    }

    /// The entry under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn current_entry(&self) -> Result<&QueueEntry, SessionError> {
        self.ensure_active()?;
        Ok(&self.queue[self.position])
    }

    /// Show the current entry's answer. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn reveal(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.revealed = true;
        Ok(())
    }

    /// Hide the current entry's answer again. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn hide(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.revealed = false;
        Ok(())
    }

    /// Grade the current card as known: remove its entry from the queue and
    /// record the card as mastered.
    ///
    /// The cursor is not advanced; removal already shifts the next entry into
    /// the current position. Completes the session when the removed entry was
    /// the last one at or after the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn grade_known(&mut self, graded_at: DateTime<Utc>) -> Result<QueueEntry, SessionError> {
        self.ensure_active()?;

        let entry = self.queue.remove(self.position);
        self.mastered.insert(entry.source_index());
        self.studied.insert(entry.source_index());
        self.revealed = false;

        if self.position == self.queue.len() {
            self.completed_at = Some(graded_at);
        }

        Ok(entry)
    }

    /// Grade the current card as needing more study: append two duplicates of
    /// it to the queue tail, then advance.
    ///
    /// Duplicates always go to the end, never interleaved, so the card is not
    /// repeated immediately but is guaranteed to reappear before the session
    /// ends.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn grade_needs_more_study(
        &mut self,
        graded_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;

        let first_seq = self.next_duplicate_seq();
        let second_seq = self.next_duplicate_seq();
        let current = &self.queue[self.position];
        let duplicates = [current.duplicate(first_seq), current.duplicate(second_seq)];
        self.queue.extend(duplicates);

        self.step_forward(graded_at);
        Ok(())
    }

    /// Move past the current card without grading it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is complete.
    pub fn advance(&mut self, advanced_at: DateTime<Utc>) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.step_forward(advanced_at);
        Ok(())
    }

    /// Step back to the previous entry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstCard` at the first position and
    /// `SessionError::Completed` once the session is complete.
    pub fn go_back(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.position == 0 {
            return Err(SessionError::AtFirstCard);
        }
        self.position -= 1;
        self.revealed = false;
        Ok(())
    }

    /// End the session regardless of the cursor position. Always safe;
    /// repeated calls keep the first completion timestamp. Queue contents and
    /// the mastered set are preserved for the summary.
    pub fn end(&mut self, ended_at: DateTime<Utc>) {
        if self.completed_at.is_none() {
            self.completed_at = Some(ended_at);
        }
    }

    /// Build the result record for this session.
    ///
    /// `cards_studied` counts distinct original cards that were graded or
    /// advanced past at least once, so repeated visits via duplicates or
    /// `go_back` are never double counted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is still active, and
    /// propagates `SessionSummaryError` if the bookkeeping is inconsistent.
    pub fn build_summary(&self) -> Result<SessionSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::Completed)?;

        let studied = u32::try_from(self.studied.len()).unwrap_or(u32::MAX);
        let mastered = u32::try_from(self.mastered.len()).unwrap_or(u32::MAX);

        Ok(SessionSummary::new(
            self.deck.clone(),
            studied,
            mastered,
            self.started_at,
            completed_at,
        )?)
    }

    pub(crate) fn set_history_id(&mut self, id: i64) {
        self.history_id = Some(id);
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(())
    }

    fn next_duplicate_seq(&mut self) -> u64 {
        self.duplicates_spawned += 1;
        self.duplicates_spawned
    }

    fn step_forward(&mut self, at: DateTime<Utc>) {
        self.studied.insert(self.queue[self.position].source_index());
        self.position += 1;
        self.revealed = false;
        if self.position == self.queue.len() {
            self.completed_at = Some(at);
        }
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("deck", &self.deck)
            .field("queue_len", &self.queue.len())
            .field("position", &self.position)
            .field("revealed", &self.revealed)
            .field("mastered", &self.mastered.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("history_id", &self.history_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

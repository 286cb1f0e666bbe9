use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use recall_core::model::Card;

use crate::error::SessionError;

//
// ─── STUDY MODE ────────────────────────────────────────────────────────────────
//

/// Ordering policy applied when a review queue is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StudyMode {
    /// Queue order equals deck order.
    #[default]
    Sequential,
    /// Queue order is a uniformly random permutation of deck order.
    Random,
}

//
// ─── INSTANCE ID ───────────────────────────────────────────────────────────────
//

/// Unique identity of one queue occurrence of a card.
///
/// Re-inserted duplicates of a card get their own id, derived from the
/// original entry's id plus a session-unique sequence number, so "the same
/// card seen again" is always distinguishable from the original occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId(String);

impl InstanceId {
    pub(crate) fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Derive the id for a duplicate entry. `seq` must be unique within the
    /// session; the suffix keeps ids distinct even when duplicates of
    /// duplicates are spawned.
    pub(crate) fn derived(&self, seq: u64) -> Self {
        Self(format!("{}-r{seq}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUEUE ENTRY ───────────────────────────────────────────────────────────────
//

/// One occurrence of a card in the review queue.
///
/// Distinct from the card itself so the queue can hold duplicates. The card
/// is shared read-only; `source_index` is the card's position in the original
/// deck list and is used for mastery attribution, never for queue ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    card: Arc<Card>,
    source_index: usize,
    instance_id: InstanceId,
}

impl QueueEntry {
    pub(crate) fn duplicate(&self, seq: u64) -> Self {
        Self {
            card: Arc::clone(&self.card),
            source_index: self.source_index,
            instance_id: self.instance_id.derived(seq),
        }
    }

    #[must_use]
    pub fn card(&self) -> &Card {
        &self.card
    }

    #[must_use]
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }
}

//
// ─── QUEUE BUILDER ─────────────────────────────────────────────────────────────
//

/// Builds the initial review queue for a study session.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueBuilder {
    mode: StudyMode,
}

impl QueueBuilder {
    #[must_use]
    pub fn new(mode: StudyMode) -> Self {
        Self { mode }
    }

    /// Build a queue from an ordered card list, using thread-local randomness
    /// for `StudyMode::Random`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no cards are supplied.
    pub fn build(
        &self,
        cards: impl IntoIterator<Item = Card>,
    ) -> Result<Vec<QueueEntry>, SessionError> {
        self.build_with_rng(cards, &mut rand::rng())
    }

    /// Build a queue with an injected randomness source, for deterministic
    /// shuffling in tests.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no cards are supplied.
    pub fn build_with_rng<R>(
        &self,
        cards: impl IntoIterator<Item = Card>,
        rng: &mut R,
    ) -> Result<Vec<QueueEntry>, SessionError>
    where
        R: Rng + ?Sized,
    {
        let mut entries: Vec<QueueEntry> = cards
            .into_iter()
            .enumerate()
            .map(|(source_index, card)| QueueEntry {
                card: Arc::new(card),
                source_index,
                instance_id: InstanceId::fresh(),
            })
            .collect();

        if entries.is_empty() {
            return Err(SessionError::Empty);
        }

        if self.mode == StudyMode::Random {
            entries.shuffle(rng);
        }

        Ok(entries)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::deck::DeckName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("cards mastered ({mastered}) exceeds cards studied ({studied})")]
    CountMismatch { studied: u32, mastered: u32 },
}

/// Result record for a finished study session.
///
/// This is the only shape the engine hands to the external history
/// collaborator, which appends it to persistent storage. `deck` is `None`
/// for a pooled session across all decks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    deck: Option<DeckName>,
    cards_studied: u32,
    cards_mastered: u32,
    accuracy: f64,
    duration_seconds: f64,
    completed_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Build a summary from session bookkeeping.
    ///
    /// Accuracy is `mastered / studied * 100`, or `0.0` when nothing was
    /// studied. Duration is the span between the two timestamps, in seconds.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is
    /// before `started_at`, and `SessionSummaryError::CountMismatch` if more
    /// cards were mastered than studied.
    pub fn new(
        deck: Option<DeckName>,
        cards_studied: u32,
        cards_mastered: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if cards_mastered > cards_studied {
            return Err(SessionSummaryError::CountMismatch {
                studied: cards_studied,
                mastered: cards_mastered,
            });
        }

        let accuracy = if cards_studied > 0 {
            f64::from(cards_mastered) / f64::from(cards_studied) * 100.0
        } else {
            0.0
        };

        #[allow(clippy::cast_precision_loss)]
        let duration_seconds =
            completed_at.signed_duration_since(started_at).num_milliseconds() as f64 / 1000.0;

        Ok(Self {
            deck,
            cards_studied,
            cards_mastered,
            accuracy,
            duration_seconds,
            completed_at,
        })
    }

    #[must_use]
    pub fn deck(&self) -> Option<&DeckName> {
        self.deck.as_ref()
    }

    #[must_use]
    pub fn cards_studied(&self) -> u32 {
        self.cards_studied
    }

    #[must_use]
    pub fn cards_mastered(&self) -> u32 {
        self.cards_mastered
    }

    /// Percentage of studied cards that were mastered, in `[0, 100]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

//! Shared error types for the services crate.

use thiserror::Error;

use recall_core::model::SessionSummaryError;
use storage::repository::StorageError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// Starting a session with zero cards. Callers must reject empty decks
    /// before invoking the engine.
    #[error("no cards available for session")]
    Empty,

    /// An active-only operation was invoked after completion. This indicates
    /// a caller logic bug (stale UI state), not a retryable condition.
    #[error("session already completed")]
    Completed,

    /// `go_back` at the first position. Recoverable; callers are expected to
    /// disable the control, the engine still guards it.
    #[error("already at the first card")]
    AtFirstCard,

    #[error(transparent)]
    Summary(#[from] SessionSummaryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

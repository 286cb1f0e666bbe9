mod progress;
mod queue;
mod state;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use queue::{InstanceId, QueueBuilder, QueueEntry, StudyMode};
pub use state::StudySession;
pub use storage::repository::HistoryId;
pub use view::{SessionHistoryListItem, SessionHistoryService};
pub use workflow::{SessionStepResult, StudyLoopService};

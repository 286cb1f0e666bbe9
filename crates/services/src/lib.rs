#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use recall_core::Clock;

pub use error::SessionError;

pub use sessions::{
    HistoryId, InstanceId, QueueBuilder, QueueEntry, SessionHistoryListItem,
    SessionHistoryService, SessionProgress, SessionStepResult, StudyLoopService, StudyMode,
    StudySession,
};

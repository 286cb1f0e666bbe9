#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    CardSource, HistoryId, InMemoryRepository, SessionHistoryRepository, SessionHistoryRow,
    StorageError,
};

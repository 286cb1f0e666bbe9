use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recall_core::model::{Card, Deck, DeckName, SessionSummary};
use recall_core::time::{fixed_clock, fixed_now};
use services::{Clock, SessionError, StudyLoopService, StudyMode};
use storage::repository::{
    HistoryId, InMemoryRepository, SessionHistoryRepository, SessionHistoryRow, StorageError,
};

fn seed_deck(repo: &InMemoryRepository, name: &str, questions: &[&str]) -> DeckName {
    let deck_name = DeckName::new(name).unwrap();
    let cards = questions
        .iter()
        .map(|q| Card::parse(*q, format!("{q} answer")).unwrap())
        .collect();
    repo.insert_deck(Deck::new(deck_name.clone(), cards, fixed_now()))
        .unwrap();
    deck_name
}

fn build_loop(repo: &InMemoryRepository, clock: Clock) -> StudyLoopService {
    StudyLoopService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()))
}

#[tokio::test]
async fn session_loop_persists_summary() {
    let repo = InMemoryRepository::new();
    let deck_name = seed_deck(&repo, "Smoke Deck", &["Q1", "Q2", "Q3"]);
    let loop_svc = build_loop(&repo, fixed_clock());

    let mut session = loop_svc.start_session(&deck_name).await.unwrap();
    while !session.is_complete() {
        session.reveal().unwrap();
        let _ = loop_svc.grade_known(&mut session).await.unwrap();
    }

    let history_id = session.history_id().expect("summary persisted");
    let summary = repo.get_summary(history_id).await.unwrap();
    assert_eq!(summary.deck().unwrap().as_str(), "Smoke Deck");
    assert_eq!(summary.cards_studied(), 3);
    assert_eq!(summary.cards_mastered(), 3);
    assert!((summary.accuracy() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn summary_is_appended_exactly_once() {
    let repo = InMemoryRepository::new();
    let deck_name = seed_deck(&repo, "Once", &["Q1"]);
    let loop_svc = build_loop(&repo, fixed_clock());

    let mut session = loop_svc.start_session(&deck_name).await.unwrap();
    let step = loop_svc.grade_known(&mut session).await.unwrap();
    assert!(step.is_complete);
    let first_id = step.history_id.unwrap();

    // Ending an already-complete session must not append a second record.
    let step = loop_svc.end_session(&mut session).await.unwrap();
    assert_eq!(step.history_id, Some(first_id));
    assert_eq!(loop_svc.finalize_summary(&mut session).await.unwrap(), first_id);

    let rows = repo.list_recent(10).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn pooled_session_covers_all_decks() {
    let repo = InMemoryRepository::new();
    seed_deck(&repo, "Alpha", &["A1", "A2"]);
    seed_deck(&repo, "Beta", &["B1"]);
    let loop_svc = build_loop(&repo, fixed_clock());

    let mut session = loop_svc.start_session_all_decks().await.unwrap();
    assert!(session.deck().is_none());
    assert_eq!(session.queue_len(), 3);

    while !session.is_complete() {
        let _ = loop_svc.grade_known(&mut session).await.unwrap();
    }

    let summary = repo.get_summary(session.history_id().unwrap()).await.unwrap();
    assert!(summary.deck().is_none());
    assert_eq!(summary.cards_studied(), 3);
}

#[tokio::test]
async fn random_mode_still_drains_the_whole_deck() {
    let repo = InMemoryRepository::new();
    let deck_name = seed_deck(&repo, "Shuffled", &["Q1", "Q2", "Q3", "Q4"]);
    let loop_svc = build_loop(&repo, fixed_clock()).with_mode(StudyMode::Random);

    let mut session = loop_svc.start_session(&deck_name).await.unwrap();
    assert_eq!(session.queue_len(), 4);

    while !session.is_complete() {
        let _ = loop_svc.grade_known(&mut session).await.unwrap();
    }

    assert_eq!(session.mastered_count(), 4);
}

#[tokio::test]
async fn unknown_deck_surfaces_storage_error() {
    let repo = InMemoryRepository::new();
    let loop_svc = build_loop(&repo, fixed_clock());

    let err = loop_svc
        .start_session(&DeckName::new("Missing").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
}

/// History double that fails a fixed number of appends before recovering.
struct FlakyHistory {
    inner: InMemoryRepository,
    failures_left: Mutex<u32>,
}

impl FlakyHistory {
    fn new(inner: InMemoryRepository, failures: u32) -> Self {
        Self {
            inner,
            failures_left: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl SessionHistoryRepository for FlakyHistory {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<HistoryId, StorageError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(StorageError::Connection("history unavailable".into()));
            }
        }
        self.inner.append_summary(summary).await
    }

    async fn get_summary(&self, id: HistoryId) -> Result<SessionSummary, StorageError> {
        self.inner.get_summary(id).await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<SessionHistoryRow>, StorageError> {
        self.inner.list_recent(limit).await
    }
}

#[tokio::test]
async fn finalize_summary_retries_after_transient_failure() {
    let repo = InMemoryRepository::new();
    let deck_name = seed_deck(&repo, "Flaky", &["Q1"]);
    let history = Arc::new(FlakyHistory::new(repo.clone(), 1));
    let loop_svc = StudyLoopService::new(fixed_clock(), Arc::new(repo.clone()), history.clone());

    let mut session = loop_svc.start_session(&deck_name).await.unwrap();
    let err = loop_svc.grade_known(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    // The session itself completed; only persistence failed.
    assert!(session.is_complete());
    assert!(session.history_id().is_none());

    let id = loop_svc.finalize_summary(&mut session).await.unwrap();
    assert_eq!(session.history_id(), Some(id));
    assert_eq!(history.get_summary(id).await.unwrap().cards_studied(), 1);
}

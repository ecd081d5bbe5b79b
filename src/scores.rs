//! Score submission boundary
//!
//! The engine hands the final score of every run to a `ScoreSubmitter` and
//! watches the outcome through a `SubmitTicket`. `ScoreBook` is the built-in
//! append-only collaborator, persisted to LocalStorage on the web.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Progress of the current run's score submission (UI only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveStatus {
    /// Nothing submitted for this run
    #[default]
    Idle,
    /// Submission in flight
    Saving,
    /// Collaborator accepted the score
    Saved,
    /// Collaborator failed; not retried
    Failed,
}

/// Why a submission failed
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Backend answered with an error
    Rejected(String),
    /// Backend or storage could not be reached
    Unavailable,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Rejected(reason) => write!(f, "score rejected: {}", reason),
            SubmitError::Unavailable => write!(f, "score storage unavailable"),
        }
    }
}

impl std::error::Error for SubmitError {}

#[derive(Debug, Default)]
struct SaveSlot {
    generation: Cell<u32>,
    status: Cell<SaveStatus>,
}

/// Shared save status of a session, handed out as tickets
#[derive(Debug, Clone, Default)]
pub struct SaveTracker {
    slot: Rc<SaveSlot>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SaveStatus {
        self.slot.status.get()
    }

    /// Mark a submission in flight and return its ticket
    pub fn begin(&self, score: u32) -> SubmitTicket {
        self.slot.status.set(SaveStatus::Saving);
        SubmitTicket {
            slot: Rc::clone(&self.slot),
            generation: self.slot.generation.get(),
            score,
        }
    }

    /// Forget the current run; outstanding tickets stop reporting
    pub fn detach(&self) {
        self.slot
            .generation
            .set(self.slot.generation.get().wrapping_add(1));
        self.slot.status.set(SaveStatus::Idle);
    }
}

/// Completion handle for one submission
///
/// Completing a ticket after its session was reset is harmless: the outcome
/// is logged and dropped.
#[derive(Debug)]
pub struct SubmitTicket {
    slot: Rc<SaveSlot>,
    generation: u32,
    score: u32,
}

impl SubmitTicket {
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether the session that issued this ticket is still waiting on it
    pub fn is_current(&self) -> bool {
        self.slot.generation.get() == self.generation
    }

    /// Report the outcome of the submission
    pub fn complete(self, outcome: Result<(), SubmitError>) {
        match &outcome {
            Ok(()) => log::info!("Score {} saved", self.score),
            Err(e) => log::warn!("Failed to save score {}: {}", self.score, e),
        }
        if !self.is_current() {
            log::debug!("Discarding outcome for a run that was reset");
            return;
        }
        let status = if outcome.is_ok() {
            SaveStatus::Saved
        } else {
            SaveStatus::Failed
        };
        self.slot.status.set(status);
    }
}

/// External collaborator receiving final scores
pub trait ScoreSubmitter {
    /// Start submitting `score`; must not block. Complete `ticket` when done.
    fn submit(&mut self, score: u32, ticket: SubmitTicket);
}

/// A single stored score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user_id: String,
    pub score: u32,
}

/// Append-only score log for one device
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScoreBook {
    /// Player the submitted scores are recorded for
    pub user_id: String,
    pub records: Vec<ScoreRecord>,
}

impl ScoreBook {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "flappy_pinta_scores";

    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            records: Vec::new(),
        }
    }

    /// Append a record for the book's user
    pub fn append(&mut self, score: u32) {
        self.records.push(ScoreRecord {
            user_id: self.user_id.clone(),
            score,
        });
    }

    /// Highest score recorded for `user_id` (0 when none)
    pub fn personal_best(&self, user_id: &str) -> u32 {
        self.records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.score)
            .max()
            .unwrap_or(0)
    }

    /// Highest score of the book's own user
    pub fn own_best(&self) -> u32 {
        self.personal_best(&self.user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the score book from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(user_id: &str) -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(mut book) = Self::from_json(&json) {
                    log::info!("Loaded {} score records", book.records.len());
                    book.user_id = user_id.to_string();
                    return book;
                }
            }
        }

        log::info!("No score records found, starting fresh");
        Self::new(user_id)
    }

    /// Save the score book to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SubmitError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(SubmitError::Unavailable)?;
        let json = self
            .to_json()
            .map_err(|e| SubmitError::Rejected(e.to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| SubmitError::Unavailable)?;
        log::info!("Score records saved ({} entries)", self.records.len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(user_id: &str) -> Self {
        Self::new(user_id)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), SubmitError> {
        // In-memory only on native
        Ok(())
    }
}

impl ScoreSubmitter for ScoreBook {
    fn submit(&mut self, score: u32, ticket: SubmitTicket) {
        self.append(score);
        ticket.complete(self.save());
    }
}

/// A `ScoreBook` the host keeps reading while a session submits into it
#[derive(Debug, Clone, Default)]
pub struct SharedScoreBook(Rc<RefCell<ScoreBook>>);

impl SharedScoreBook {
    pub fn new(book: ScoreBook) -> Self {
        Self(Rc::new(RefCell::new(book)))
    }

    /// Best score of the book's own user, including runs submitted since
    pub fn own_best(&self) -> u32 {
        self.0.borrow().own_best()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl ScoreSubmitter for SharedScoreBook {
    fn submit(&mut self, score: u32, ticket: SubmitTicket) {
        self.0.borrow_mut().submit(score, ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personal_best_per_user() {
        let mut book = ScoreBook::new("ana");
        assert_eq!(book.own_best(), 0);
        book.append(3);
        book.append(9);
        book.append(4);
        book.records.push(ScoreRecord {
            user_id: "bo".to_string(),
            score: 20,
        });
        assert_eq!(book.own_best(), 9);
        assert_eq!(book.personal_best("bo"), 20);
        assert_eq!(book.personal_best("nobody"), 0);
    }

    #[test]
    fn test_json_roundtrip_keeps_records() {
        let mut book = ScoreBook::new("ana");
        book.append(7);
        let json = book.to_json().expect("serialize");
        let back = ScoreBook::from_json(&json).expect("deserialize");
        assert_eq!(back.records, book.records);
    }

    #[test]
    fn test_ticket_reports_status() {
        let tracker = SaveTracker::new();
        assert_eq!(tracker.status(), SaveStatus::Idle);

        let ticket = tracker.begin(5);
        assert_eq!(tracker.status(), SaveStatus::Saving);
        ticket.complete(Ok(()));
        assert_eq!(tracker.status(), SaveStatus::Saved);

        let ticket = tracker.begin(1);
        ticket.complete(Err(SubmitError::Unavailable));
        assert_eq!(tracker.status(), SaveStatus::Failed);
    }

    #[test]
    fn test_detached_ticket_is_ignored() {
        let tracker = SaveTracker::new();
        let ticket = tracker.begin(1);
        tracker.detach();
        assert!(!ticket.is_current());
        ticket.complete(Err(SubmitError::Rejected("late".into())));
        assert_eq!(tracker.status(), SaveStatus::Idle);
    }

    #[test]
    fn test_shared_book_sees_submissions() {
        let tracker = SaveTracker::new();
        let shared = SharedScoreBook::new(ScoreBook::new("ana"));
        let mut submitter = shared.clone();
        assert!(shared.is_empty());

        submitter.submit(4, tracker.begin(4));
        submitter.submit(2, tracker.begin(2));
        assert_eq!(shared.len(), 2);
        assert_eq!(shared.own_best(), 4);
        assert_eq!(tracker.status(), SaveStatus::Saved);
    }

    #[test]
    fn test_book_submitter_completes_immediately() {
        let tracker = SaveTracker::new();
        let mut book = ScoreBook::new("ana");
        book.submit(12, tracker.begin(12));
        assert_eq!(tracker.status(), SaveStatus::Saved);
        assert_eq!(book.own_best(), 12);
    }
}

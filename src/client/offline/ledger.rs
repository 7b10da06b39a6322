//! # Offline Progress Ledger
//!
//! Accumulates progress graded locally until the server has accepted it.
//!
//! Each mutation is a read-modify-write of a single store key guarded by the
//! stored version: if another client process wrote in between, the write is
//! rejected and the update is replayed on the fresh value. Nothing is
//! batched; `record` returns only after the increment is durable.

use crate::client::local_store::{keys, LocalStore, StoreError};
use crate::shared::api_types::ProgressDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

const MAX_CAS_ATTEMPTS: usize = 16;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("ledger kept changing underneath us after {0} attempts")]
    Contended(usize),
}

/// Persisted ledger value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub questions_answered: u32,
    /// Never exceeds `questions_answered`
    pub correct_answers: u32,
    pub xp: u64,
    /// True iff the fields above hold progress the server has not confirmed
    pub pending_sync: bool,
}

impl LedgerSnapshot {
    pub fn delta(&self) -> ProgressDelta {
        ProgressDelta {
            questions_answered: self.questions_answered,
            correct_answers: self.correct_answers,
            xp: self.xp,
        }
    }

    fn record(&mut self, is_correct: bool, xp_gained: u32) {
        self.questions_answered = self.questions_answered.saturating_add(1);
        if is_correct {
            self.correct_answers = self.correct_answers.saturating_add(1);
            self.xp = self.xp.saturating_add(u64::from(xp_gained));
        }
        self.pending_sync = true;
    }

    /// Remove progress the server confirmed, keeping anything recorded since
    fn settle(&mut self, synced: &ProgressDelta) {
        self.questions_answered = self.questions_answered.saturating_sub(synced.questions_answered);
        self.correct_answers = self
            .correct_answers
            .saturating_sub(synced.correct_answers)
            .min(self.questions_answered);
        self.xp = self.xp.saturating_sub(synced.xp);
        self.pending_sync = self.questions_answered > 0;
    }
}

/// Handle to the persisted ledger. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OfflineLedger {
    store: LocalStore,
}

impl OfflineLedger {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Count one locally graded answer; XP only counts when correct
    pub async fn record(&self, is_correct: bool, xp_gained: u32) -> Result<LedgerSnapshot, LedgerError> {
        let updated = self.update(|ledger| ledger.record(is_correct, xp_gained)).await?;
        debug!(
            "Recorded offline answer: {} answered, {} correct, {} xp pending",
            updated.questions_answered, updated.correct_answers, updated.xp
        );
        Ok(updated)
    }

    /// Current value; zeroed if nothing was ever recorded
    pub async fn read(&self) -> Result<LedgerSnapshot, LedgerError> {
        Ok(self
            .store
            .get::<LedgerSnapshot>(keys::OFFLINE_PROGRESS)
            .await?
            .map(|stored| stored.value)
            .unwrap_or_default())
    }

    /// Zero every field
    pub async fn reset(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.update(|ledger| *ledger = LedgerSnapshot::default()).await
    }

    /// Subtract a delta the server acknowledged
    pub async fn settle(&self, synced: &ProgressDelta) -> Result<LedgerSnapshot, LedgerError> {
        self.update(|ledger| ledger.settle(synced)).await
    }

    async fn update(
        &self,
        mut apply: impl FnMut(&mut LedgerSnapshot),
    ) -> Result<LedgerSnapshot, LedgerError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.store.get::<LedgerSnapshot>(keys::OFFLINE_PROGRESS).await?;
            let (mut ledger, expected) = match current {
                Some(stored) => (stored.value, Some(stored.version)),
                None => (LedgerSnapshot::default(), None),
            };

            apply(&mut ledger);

            if self
                .store
                .compare_and_swap(keys::OFFLINE_PROGRESS, expected, &ledger)
                .await?
            {
                return Ok(ledger);
            }
            debug!("Ledger changed concurrently, retrying (attempt {})", attempt);
        }

        error!("Giving up on ledger update after {} attempts", MAX_CAS_ATTEMPTS);
        Err(LedgerError::Contended(MAX_CAS_ATTEMPTS))
    }
}

//! Storage abstraction for the ledger engine.
//!
//! The engine talks to storage only through these traits. Every commit
//! method is atomic: it either writes everything it is given or nothing.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId};

use crate::accounts::Account;
use crate::ledger::{JournalEntry, LedgerError, LedgerLine};
use crate::posting::{PostingCommit, ReversalCommit};
use crate::reconciliation::Reconciliation;

pub use memory::InMemoryStore;

/// Inclusive accounting-date window for ledger line reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    /// First accounting date included.
    pub from: Option<NaiveDate>,
    /// Last accounting date included.
    pub to: Option<NaiveDate>,
}

impl LineRange {
    /// Every line.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Lines dated on or before `as_of`.
    #[must_use]
    pub const fn as_of(as_of: NaiveDate) -> Self {
        Self {
            from: None,
            to: Some(as_of),
        }
    }

    /// Lines dated within `[from, to]`.
    #[must_use]
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Lines dated strictly before `date`.
    #[must_use]
    pub fn before(date: NaiveDate) -> Self {
        match date.pred_opt() {
            Some(prev) => Self::as_of(prev),
            None => Self::between(NaiveDate::MAX, NaiveDate::MIN),
        }
    }

    /// Returns true if no date can fall inside the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }

    /// Returns true if `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Chart of accounts persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken.
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerError>;

    /// Loads an account.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Lists all accounts ordered by code.
    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Sets the active flag and returns the updated account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    async fn set_account_active(
        &self,
        id: AccountId,
        is_active: bool,
        at: DateTime<Utc>,
    ) -> Result<Account, LedgerError>;
}

/// Journal entry document persistence.
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Inserts a new draft entry.
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerError>;

    /// Loads an entry with its lines.
    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerError>;

    /// Replaces a stored draft last written at `expected_updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `NotDraft` if the stored
    /// entry is no longer a draft, and `ConcurrentModification` if the
    /// draft was written since `expected_updated_at`.
    async fn update_draft(
        &self,
        entry: &JournalEntry,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Deletes a stored draft last written at `expected_updated_at`.
    ///
    /// # Errors
    ///
    /// As for [`JournalStore::update_draft`].
    async fn delete_draft(
        &self,
        id: JournalEntryId,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Counts draft entries with at least one line on the account.
    async fn count_drafts_for_account(&self, account_id: AccountId) -> Result<u64, LedgerError>;
}

/// Append-only ledger line persistence. No update or delete exists.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends the posting's lines and flips the entry to Posted.
    ///
    /// # Errors
    ///
    /// - `EntryAlreadyPosted` if lines for the entry already exist
    /// - `AlreadyPosted` if the stored entry is not a draft
    /// - `ConcurrentModification` if the draft changed after the commit was
    ///   prepared (see [`PostingCommit::draft_updated_at`])
    /// - `NotFound` if the entry does not exist
    async fn commit_posting(&self, commit: &PostingCommit) -> Result<(), LedgerError>;

    /// Inserts the reversal entry, appends its lines and marks the original.
    ///
    /// # Errors
    ///
    /// - `AlreadyReversed` if the stored original is already reversed
    /// - `NotPosted` if the stored original is a draft
    /// - `NotFound` if the original does not exist
    async fn commit_reversal(&self, commit: &ReversalCommit) -> Result<(), LedgerError>;

    /// Lines on one account within the window, in ledger order.
    async fn lines_for_account(
        &self,
        account_id: AccountId,
        range: LineRange,
    ) -> Result<Vec<LedgerLine>, LedgerError>;

    /// Lines of one posted entry, by line number.
    async fn lines_for_entry(&self, entry_id: JournalEntryId) -> Result<Vec<LedgerLine>, LedgerError>;

    /// Lines on every account within the window, in ledger order.
    async fn lines_in_range(&self, range: LineRange) -> Result<Vec<LedgerLine>, LedgerError>;
}

/// Reconciliation snapshot persistence (append-only).
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Stores a snapshot.
    async fn insert_reconciliation(&self, reconciliation: &Reconciliation) -> Result<(), LedgerError>;

    /// Snapshots for one account, oldest first.
    async fn reconciliations_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Reconciliation>, LedgerError>;
}

/// Everything the engine needs from a backend.
pub trait Storage: AccountStore + JournalStore + LedgerStore + ReconciliationStore {}

impl<T> Storage for T where T: AccountStore + JournalStore + LedgerStore + ReconciliationStore {}

/// Rejects a write prepared against an older version of `stored`.
///
/// # Errors
///
/// Returns `ConcurrentModification` if `stored.updated_at` differs from
/// `expected_updated_at`.
pub fn ensure_version(
    stored: &JournalEntry,
    expected_updated_at: DateTime<Utc>,
) -> Result<(), LedgerError> {
    if stored.updated_at == expected_updated_at {
        Ok(())
    } else {
        Err(LedgerError::ConcurrentModification)
    }
}

/// Sorts lines into ledger order.
pub fn sort_ledger_order(lines: &mut [LedgerLine]) {
    lines.sort_by_key(LedgerLine::ledger_order_key);
}

//! In-memory storage backend.
//!
//! Each commit runs inside one write-lock critical section and validates
//! everything before mutating, so a failed commit leaves no trace.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tally_shared::types::{AccountId, JournalEntryId};
use tokio::sync::RwLock;

use super::{
    AccountStore, JournalStore, LedgerStore, LineRange, ReconciliationStore, ensure_version,
    sort_ledger_order,
};
use crate::accounts::Account;
use crate::ledger::{EntryStatus, JournalEntry, LedgerError, LedgerLine};
use crate::posting::{PostingCommit, ReversalCommit};
use crate::reconciliation::Reconciliation;

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    ledger: Vec<LedgerLine>,
    posted: HashSet<JournalEntryId>,
    reconciliations: Vec<Reconciliation>,
}

impl MemoryState {
    fn stored_entry(&self, id: JournalEntryId) -> Result<&JournalEntry, LedgerError> {
        self.entries.get(&id).ok_or(LedgerError::NotFound(id))
    }

    fn stored_draft(&self, id: JournalEntryId) -> Result<&JournalEntry, LedgerError> {
        let entry = self.stored_entry(id)?;
        if entry.status == EntryStatus::Draft {
            Ok(entry)
        } else {
            Err(LedgerError::NotDraft {
                id,
                status: entry.status,
            })
        }
    }
}

/// Storage backend holding everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fail_next_commit: AtomicBool,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next posting or reversal commit fail with a storage error.
    pub fn inject_commit_failure(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Total number of ledger lines stored.
    pub async fn ledger_len(&self) -> usize {
        self.state.read().await.ledger.len()
    }

    fn take_injected_failure(&self) -> Result<(), LedgerError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Storage("injected commit failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        if state.accounts.values().any(|a| a.code == account.code) {
            return Err(LedgerError::DuplicateCode(account.code.clone()));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut accounts: Vec<Account> =
            self.state.read().await.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn set_account_active(
        &self,
        id: AccountId,
        is_active: bool,
        at: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.is_active = is_active;
        account.updated_at = at;
        Ok(account.clone())
    }
}

#[async_trait]
impl JournalStore for InMemoryStore {
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerError> {
        self.state
            .write()
            .await
            .entries
            .insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerError> {
        Ok(self.state.read().await.entries.get(&id).cloned())
    }

    async fn update_draft(
        &self,
        entry: &JournalEntry,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        ensure_version(state.stored_draft(entry.id)?, expected_updated_at)?;
        state.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn delete_draft(
        &self,
        id: JournalEntryId,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        ensure_version(state.stored_draft(id)?, expected_updated_at)?;
        state.entries.remove(&id);
        Ok(())
    }

    async fn count_drafts_for_account(&self, account_id: AccountId) -> Result<u64, LedgerError> {
        let state = self.state.read().await;
        let drafts = state
            .entries
            .values()
            .filter(|e| e.status == EntryStatus::Draft)
            .filter(|e| e.lines.iter().any(|l| l.account_id == account_id))
            .count();
        Ok(drafts as u64)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn commit_posting(&self, commit: &PostingCommit) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let id = commit.entry.id;

        if state.posted.contains(&id) {
            return Err(LedgerError::EntryAlreadyPosted(id));
        }
        let stored = state.stored_entry(id)?;
        if stored.status != EntryStatus::Draft {
            return Err(LedgerError::AlreadyPosted(id));
        }
        ensure_version(stored, commit.draft_updated_at)?;
        self.take_injected_failure()?;

        state.ledger.extend(commit.lines.iter().cloned());
        state.posted.insert(id);
        state.entries.insert(id, commit.entry.clone());
        Ok(())
    }

    async fn commit_reversal(&self, commit: &ReversalCommit) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let original_id = commit.original.id;
        let reversal_id = commit.reversal.id;

        match state.stored_entry(original_id)?.status {
            EntryStatus::Posted => {}
            EntryStatus::Draft => return Err(LedgerError::NotPosted(original_id)),
            EntryStatus::Reversed => return Err(LedgerError::AlreadyReversed(original_id)),
        }
        if state.posted.contains(&reversal_id) {
            return Err(LedgerError::EntryAlreadyPosted(reversal_id));
        }
        self.take_injected_failure()?;

        state.ledger.extend(commit.lines.iter().cloned());
        state.posted.insert(reversal_id);
        state.entries.insert(reversal_id, commit.reversal.clone());
        state.entries.insert(original_id, commit.original.clone());
        Ok(())
    }

    async fn lines_for_account(
        &self,
        account_id: AccountId,
        range: LineRange,
    ) -> Result<Vec<LedgerLine>, LedgerError> {
        let state = self.state.read().await;
        let mut lines: Vec<LedgerLine> = state
            .ledger
            .iter()
            .filter(|l| l.account_id == account_id && range.contains(l.entry_date))
            .cloned()
            .collect();
        sort_ledger_order(&mut lines);
        Ok(lines)
    }

    async fn lines_for_entry(&self, entry_id: JournalEntryId) -> Result<Vec<LedgerLine>, LedgerError> {
        let state = self.state.read().await;
        let mut lines: Vec<LedgerLine> = state
            .ledger
            .iter()
            .filter(|l| l.entry_id == entry_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.line_no);
        Ok(lines)
    }

    async fn lines_in_range(&self, range: LineRange) -> Result<Vec<LedgerLine>, LedgerError> {
        let state = self.state.read().await;
        let mut lines: Vec<LedgerLine> = state
            .ledger
            .iter()
            .filter(|l| range.contains(l.entry_date))
            .cloned()
            .collect();
        sort_ledger_order(&mut lines);
        Ok(lines)
    }
}

#[async_trait]
impl ReconciliationStore for InMemoryStore {
    async fn insert_reconciliation(&self, reconciliation: &Reconciliation) -> Result<(), LedgerError> {
        self.state
            .write()
            .await
            .reconciliations
            .push(reconciliation.clone());
        Ok(())
    }

    async fn reconciliations_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Reconciliation>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .reconciliations
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect())
    }
}

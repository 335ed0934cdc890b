//! Journal entry lifecycle and posting.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tally_shared::types::{AccountId, ActorId, JournalEntryId};
use tracing::{info, warn};

use super::LedgerEngine;
use crate::accounts::Account;
use crate::ledger::{
    AccountInfo, CreateEntryInput, JournalEntry, JournalLine, JournalLineInput, LedgerError,
    LedgerService, UpdateEntryInput,
};
use crate::posting::{PostingCommit, PostingEngine, ReversalCommit};
use crate::store::{Storage, ensure_version};
use crate::workflow::{ReversalService, WorkflowService};

/// The two entries affected by a reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalResult {
    /// The original entry, now Reversed.
    pub original: JournalEntry,
    /// The new posted reversal entry.
    pub reversal: JournalEntry,
}

fn account_info(account: &Account) -> AccountInfo {
    AccountInfo {
        id: account.id,
        is_active: account.is_active,
        currency: account.currency.clone(),
    }
}

fn line_inputs(lines: &[JournalLine]) -> Vec<JournalLineInput> {
    lines
        .iter()
        .map(|line| JournalLineInput {
            account_id: line.account_id,
            debit: line.debit(),
            credit: line.credit(),
            description: line.description.clone(),
        })
        .collect()
}

impl<S> LedgerEngine<S>
where
    S: Storage + 'static,
{
    async fn validate_lines(
        &self,
        inputs: &[JournalLineInput],
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let ids: Vec<AccountId> = inputs.iter().map(|l| l.account_id).collect();
        let accounts = self.load_accounts(&ids).await?;
        let (lines, _) =
            LedgerService::validate_lines(inputs, |id| accounts.get(&id).map(account_info))?;
        Ok(lines)
    }

    /// Creates a draft entry.
    ///
    /// An entry that fails validation is rejected and never stored. The
    /// line accounts are held while validating and storing, so a
    /// concurrent deactivation cannot slip in between.
    ///
    /// # Errors
    ///
    /// `InsufficientLines`, `InvalidLine`, `UnknownAccount`,
    /// `CurrencyMismatch`, `UnbalancedEntry`, `AmountOverflow`, or
    /// `PostingTimeout` if the accounts are not available in time.
    pub async fn create_entry(
        &self,
        input: CreateEntryInput,
        actor: ActorId,
    ) -> Result<JournalEntry, LedgerError> {
        let ids: Vec<AccountId> = input.lines.iter().map(|l| l.account_id).collect();
        let _guard = self.lock_accounts(&ids).await?;

        let lines = self.validate_lines(&input.lines).await?;
        let entry = JournalEntry::draft(
            input.entry_date,
            input.reference,
            input.description,
            lines,
            actor,
            Utc::now(),
        );
        self.store.insert_entry(&entry).await?;

        info!(
            entry_id = %entry.id,
            reference = %entry.reference,
            lines = entry.lines.len(),
            actor = %actor,
            "Journal entry drafted"
        );
        Ok(entry)
    }

    /// Applies a patch to a draft entry and re-validates it.
    ///
    /// Holds the accounts of both the stored and the patched lines, so the
    /// patch cannot interleave with a posting of the same draft.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotDraft`, `PostingTimeout`, `ConcurrentModification`
    /// if the draft changed while waiting for the accounts, or any of the
    /// `create_entry` validation errors.
    pub async fn update_entry(
        &self,
        id: JournalEntryId,
        patch: UpdateEntryInput,
        actor: ActorId,
    ) -> Result<JournalEntry, LedgerError> {
        let seen = self.require_entry(id).await?;
        WorkflowService::ensure_draft(&seen)?;

        let inputs = patch.lines.unwrap_or_else(|| line_inputs(&seen.lines));
        let mut held = seen.account_ids();
        held.extend(inputs.iter().map(|l| l.account_id));
        let _guard = self.lock_accounts(&held).await?;

        let current = self.require_current_draft(&seen).await?;
        let lines = self.validate_lines(&inputs).await?;

        let updated = JournalEntry {
            entry_date: patch.entry_date.unwrap_or(current.entry_date),
            reference: patch.reference.unwrap_or_else(|| current.reference.clone()),
            description: patch
                .description
                .unwrap_or_else(|| current.description.clone()),
            lines,
            updated_at: Utc::now(),
            ..current
        };
        self.store.update_draft(&updated, seen.updated_at).await?;

        info!(entry_id = %id, actor = %actor, "Journal entry updated");
        Ok(updated)
    }

    /// Deletes a draft entry.
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotDraft`, `PostingTimeout` or `ConcurrentModification`.
    pub async fn delete_entry(&self, id: JournalEntryId, actor: ActorId) -> Result<(), LedgerError> {
        let seen = self.require_entry(id).await?;
        WorkflowService::ensure_draft(&seen)?;
        let _guard = self.lock_accounts(&seen.account_ids()).await?;

        self.require_current_draft(&seen).await?;
        self.store.delete_draft(id, seen.updated_at).await?;

        info!(entry_id = %id, actor = %actor, "Journal entry deleted");
        Ok(())
    }

    /// Re-reads a draft under its account locks and checks nobody wrote it
    /// since `seen` was loaded.
    async fn require_current_draft(&self, seen: &JournalEntry) -> Result<JournalEntry, LedgerError> {
        let current = self.require_entry(seen.id).await?;
        WorkflowService::ensure_draft(&current)?;
        ensure_version(&current, seen.updated_at).inspect_err(|_| {
            warn!(entry_id = %seen.id, "Draft changed while waiting for account locks");
        })?;
        Ok(current)
    }

    /// Loads an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub async fn get_entry(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        self.require_entry(id).await
    }

    /// Posts a draft entry to the ledger.
    ///
    /// The ledger lines and the status change are committed together; on
    /// any failure the entry stays a draft with no ledger effect.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `AlreadyPosted` for a missing or non-draft entry
    /// - `AccountFrozen` if an account is frozen
    /// - `PostingTimeout` if the account locks are not available in time
    /// - any `create_entry` validation error
    /// - `EntryAlreadyPosted` if ledger lines already exist for the entry
    /// - `ConcurrentModification` if the draft was edited after it was read
    pub async fn post_entry(
        &self,
        id: JournalEntryId,
        actor: ActorId,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = self.require_entry(id).await?;
        WorkflowService::ensure_postable(&entry).inspect_err(|err| {
            warn!(entry_id = %id, actor = %actor, "Post rejected: {err}");
        })?;

        let account_ids = entry.account_ids();
        self.ensure_not_frozen(&account_ids)?;
        let guard = self.lock_accounts(&account_ids).await?;

        // Authoritative re-check now that the accounts are held.
        let entry = self.require_entry(id).await?;
        WorkflowService::ensure_postable(&entry)?;
        let account_ids = entry.account_ids();
        if !account_ids.iter().all(|a| guard.accounts().contains(a)) {
            warn!(entry_id = %id, actor = %actor, "Draft accounts changed before posting");
            return Err(LedgerError::ConcurrentModification);
        }
        self.ensure_not_frozen(&account_ids)?;

        let accounts = self.load_accounts(&account_ids).await?;
        LedgerService::validate_lines(&line_inputs(&entry.lines), |id| {
            accounts.get(&id).map(account_info)
        })?;

        let posted_at = Utc::now();
        let lines = PostingEngine::prepare_lines(&entry, posted_at, |id| {
            accounts.get(&id).map(Account::normal_side)
        })?;
        let commit = PostingCommit {
            entry: WorkflowService::posted(&entry, actor, posted_at),
            lines,
            draft_updated_at: entry.updated_at,
        };
        let posted = commit.entry.clone();

        let store = self.store.clone();
        self.run_detached(async move { store.commit_posting(&commit).await })
            .await
            .inspect_err(|err| {
                warn!(entry_id = %id, actor = %actor, "Posting commit failed: {err}");
            })?;

        info!(
            entry_id = %id,
            lines = posted.lines.len(),
            actor = %actor,
            "Journal entry posted"
        );
        Ok(posted)
    }

    /// Reverses a posted entry with a mirrored sibling entry.
    ///
    /// Creating the reversal, posting its lines, and marking the original
    /// happen in one commit.
    ///
    /// # Errors
    ///
    /// - `ReversalReasonRequired` for a blank reason
    /// - `NotFound`, `NotPosted` or `AlreadyReversed` for the original
    /// - `AccountFrozen` / `PostingTimeout` as for posting
    pub async fn reverse_entry(
        &self,
        id: JournalEntryId,
        reason: &str,
        actor: ActorId,
    ) -> Result<ReversalResult, LedgerError> {
        let original = self.require_entry(id).await?;
        WorkflowService::ensure_reversible(&original, reason).inspect_err(|err| {
            warn!(entry_id = %id, actor = %actor, "Reversal rejected: {err}");
        })?;

        let account_ids = original.account_ids();
        self.ensure_not_frozen(&account_ids)?;
        let _guard = self.lock_accounts(&account_ids).await?;

        let original = self.require_entry(id).await?;
        WorkflowService::ensure_reversible(&original, reason)?;
        if !ReversalService::validate_reversal(&original.lines) {
            return Err(LedgerError::Storage(format!(
                "stored entry {id} is not balanced"
            )));
        }

        let accounts: HashMap<AccountId, Account> = self.load_accounts(&account_ids).await?;
        let now = Utc::now();
        let reversal = ReversalService::create_reversal(&original, reason, actor, now);
        let lines = PostingEngine::prepare_lines(&reversal, now, |id| {
            accounts.get(&id).map(Account::normal_side)
        })?;
        let commit = ReversalCommit {
            original: WorkflowService::reversed(&original, reversal.id, reason, actor, now),
            reversal,
            lines,
        };
        let result = ReversalResult {
            original: commit.original.clone(),
            reversal: commit.reversal.clone(),
        };

        let store = self.store.clone();
        self.run_detached(async move { store.commit_reversal(&commit).await })
            .await
            .inspect_err(|err| {
                warn!(entry_id = %id, actor = %actor, "Reversal commit failed: {err}");
            })?;

        info!(
            entry_id = %id,
            reversal_id = %result.reversal.id,
            actor = %actor,
            "Journal entry reversed"
        );
        Ok(result)
    }
}

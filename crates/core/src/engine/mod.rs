//! The ledger engine.
//!
//! `LedgerEngine` is the in-process entry point for every ledger
//! operation. It validates through the pure services, serializes ledger
//! mutations per account, and delegates persistence to a [`Storage`]
//! backend.

mod accounts;
mod entries;
mod reads;
mod reconcile;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tally_shared::LedgerConfig;
use tally_shared::types::{AccountId, ActorId, JournalEntryId};
use tracing::{error, info, warn};

use crate::accounts::Account;
use crate::ledger::{JournalEntry, LedgerError};
use crate::posting::{AccountLocks, PostingGuard};
use crate::store::Storage;

pub use entries::ReversalResult;

/// Why and when an account was frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeRecord {
    /// The frozen account.
    pub account_id: AccountId,
    /// The violation that caused the freeze.
    pub reason: String,
    /// When the freeze started.
    pub frozen_at: DateTime<Utc>,
}

/// Double-entry ledger engine over a storage backend.
pub struct LedgerEngine<S> {
    store: Arc<S>,
    config: LedgerConfig,
    locks: AccountLocks,
    frozen: DashMap<AccountId, FreezeRecord>,
}

impl<S> LedgerEngine<S>
where
    S: Storage + 'static,
{
    /// Creates an engine over `store`.
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            locks: AccountLocks::new(),
            frozen: DashMap::new(),
        }
    }

    /// The storage backend.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The engine configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Per-account locks. Every write that touches an account's entries
    /// holds its lock.
    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    // ========== Freeze handling ==========

    /// Accounts currently frozen, ordered by id.
    pub fn frozen_accounts(&self) -> Vec<FreezeRecord> {
        let mut records: Vec<FreezeRecord> =
            self.frozen.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.account_id);
        records
    }

    /// Returns true if the account is frozen.
    pub fn is_frozen(&self, account_id: AccountId) -> bool {
        self.frozen.contains_key(&account_id)
    }

    /// Lifts the freeze on an account. Returns false if it was not frozen.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn release_freeze(
        &self,
        account_id: AccountId,
        actor: ActorId,
    ) -> Result<bool, LedgerError> {
        self.require_account(account_id).await?;
        let released = self.frozen.remove(&account_id).is_some();
        if released {
            info!(account_id = %account_id, actor = %actor, "Account freeze released");
        }
        Ok(released)
    }

    fn freeze(&self, accounts: &[AccountId], violation: &LedgerError) {
        let now = Utc::now();
        for id in accounts {
            self.frozen.entry(*id).or_insert_with(|| FreezeRecord {
                account_id: *id,
                reason: violation.to_string(),
                frozen_at: now,
            });
        }
        error!(
            error_code = violation.error_code(),
            accounts = accounts.len(),
            "Ledger consistency violation, accounts frozen: {violation}"
        );
    }

    fn ensure_not_frozen(&self, accounts: &[AccountId]) -> Result<(), LedgerError> {
        match accounts.iter().find(|id| self.frozen.contains_key(*id)) {
            Some(id) => Err(LedgerError::AccountFrozen(*id)),
            None => Ok(()),
        }
    }

    // ========== Shared helpers ==========

    async fn require_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .get_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn require_entry(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        self.store
            .get_entry(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    /// Loads the given accounts; unknown ids are simply absent from the map.
    async fn load_accounts(
        &self,
        ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Account>, LedgerError> {
        let mut accounts = HashMap::with_capacity(ids.len());
        for id in ids {
            if accounts.contains_key(id) {
                continue;
            }
            if let Some(account) = self.store.get_account(*id).await? {
                accounts.insert(*id, account);
            }
        }
        Ok(accounts)
    }

    async fn lock_accounts(&self, accounts: &[AccountId]) -> Result<PostingGuard, LedgerError> {
        self.locks
            .acquire(accounts, self.config.posting_timeout())
            .await
            .inspect_err(|err| {
                warn!(accounts = accounts.len(), "Posting lock acquisition failed: {err}");
            })
    }

    /// Runs a storage commit on its own task so dropping the caller's future
    /// cannot interrupt it.
    async fn run_detached<F>(&self, commit: F) -> Result<(), LedgerError>
    where
        F: Future<Output = Result<(), LedgerError>> + Send + 'static,
    {
        tokio::spawn(commit)
            .await
            .map_err(|err| LedgerError::Storage(format!("commit task failed: {err}")))?
    }
}

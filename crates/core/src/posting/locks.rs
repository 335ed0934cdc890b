//! Per-account posting locks.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tally_shared::types::AccountId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::ledger::LedgerError;

/// Keyed lock table serializing ledger mutations per account.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

/// Holds the locks of every account touched by one posting.
///
/// Released on drop.
#[derive(Debug)]
pub struct PostingGuard {
    accounts: Vec<AccountId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl PostingGuard {
    /// Accounts held by this guard, in acquisition order.
    #[must_use]
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }
}

impl AccountLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Acquires the locks of `accounts` in sorted id order.
    ///
    /// The whole acquisition is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `PostingTimeout` if the locks are not all held in time; any
    /// locks taken so far are released.
    pub async fn acquire(
        &self,
        accounts: &[AccountId],
        timeout: Duration,
    ) -> Result<PostingGuard, LedgerError> {
        let mut sorted = accounts.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let handles: Vec<Arc<Mutex<()>>> = sorted.iter().map(|id| self.handle(*id)).collect();

        let acquire_all = async move {
            let mut guards = Vec::with_capacity(handles.len());
            for handle in handles {
                guards.push(handle.lock_owned().await);
            }
            guards
        };

        match tokio::time::timeout(timeout, acquire_all).await {
            Ok(guards) => Ok(PostingGuard {
                accounts: sorted,
                _guards: guards,
            }),
            Err(_) => Err(LedgerError::PostingTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Number of accounts that have ever been locked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no account has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_sorts_and_dedups() {
        let locks = AccountLocks::new();
        let a = AccountId::new();
        let b = AccountId::new();
        let guard = locks
            .acquire(&[b, a, b], Duration::from_millis(100))
            .await
            .unwrap();
        let mut expected = vec![a, b];
        expected.sort_unstable();
        assert_eq!(guard.accounts(), expected.as_slice());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_held_lock_times_out() {
        let locks = AccountLocks::new();
        let a = AccountId::new();
        let _held = locks.acquire(&[a], Duration::from_millis(100)).await.unwrap();

        let result = locks.acquire(&[a], Duration::from_millis(20)).await;
        assert!(matches!(
            result,
            Err(LedgerError::PostingTimeout { timeout_ms: 20 })
        ));
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = AccountLocks::new();
        let a = AccountId::new();
        {
            let _guard = locks.acquire(&[a], Duration::from_millis(100)).await.unwrap();
        }
        assert!(locks.acquire(&[a], Duration::from_millis(100)).await.is_ok());
    }

    #[tokio::test]
    async fn test_disjoint_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _a = locks
            .acquire(&[AccountId::new()], Duration::from_millis(100))
            .await
            .unwrap();
        assert!(
            locks
                .acquire(&[AccountId::new()], Duration::from_millis(20))
                .await
                .is_ok()
        );
    }
}

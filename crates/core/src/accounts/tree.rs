//! Account hierarchy as an adjacency map keyed by id.

use rust_decimal::Decimal;
use std::collections::HashMap;
use tally_shared::types::AccountId;

use super::types::Account;
use crate::ledger::{LedgerError, checked_sum};

/// Parent pointers and child lists of the chart of accounts.
///
/// Children are kept in account code order.
#[derive(Debug, Clone, Default)]
pub struct AccountTree {
    parents: HashMap<AccountId, Option<AccountId>>,
    children: HashMap<AccountId, Vec<AccountId>>,
    roots: Vec<AccountId>,
}

impl AccountTree {
    /// Builds the tree from a flat account list.
    ///
    /// Accounts whose parent is not in the list are treated as roots.
    #[must_use]
    pub fn build(accounts: &[Account]) -> Self {
        let mut sorted: Vec<&Account> = accounts.iter().collect();
        sorted.sort_by(|a, b| a.code.cmp(&b.code));

        let mut tree = Self::default();
        for account in &sorted {
            tree.parents.insert(account.id, account.parent_id);
            tree.children.entry(account.id).or_default();
        }
        for account in &sorted {
            match account.parent_id {
                Some(parent) if tree.parents.contains_key(&parent) => {
                    tree.children.entry(parent).or_default().push(account.id);
                }
                _ => tree.roots.push(account.id),
            }
        }
        tree
    }

    /// Returns true if the account is part of the tree.
    #[must_use]
    pub fn contains(&self, id: AccountId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Top-level accounts in code order.
    #[must_use]
    pub fn roots(&self) -> &[AccountId] {
        &self.roots
    }

    /// Returns the parent of an account.
    #[must_use]
    pub fn parent(&self, id: AccountId) -> Option<AccountId> {
        self.parents.get(&id).copied().flatten()
    }

    /// Direct children of an account.
    #[must_use]
    pub fn children(&self, id: AccountId) -> &[AccountId] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// All accounts below `id`, depth-first in code order. Excludes `id`.
    #[must_use]
    pub fn descendants(&self, id: AccountId) -> Vec<AccountId> {
        let mut out = Vec::new();
        let mut stack: Vec<AccountId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Path from the direct parent up to the root. Excludes `id`.
    #[must_use]
    pub fn ancestors(&self, id: AccountId) -> Vec<AccountId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if out.contains(&parent) {
                break;
            }
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Sums `value` over `id` and all its descendants.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the sum leaves the decimal range.
    pub fn rollup<F>(&self, id: AccountId, value: F) -> Result<Decimal, LedgerError>
    where
        F: Fn(AccountId) -> Decimal,
    {
        checked_sum(std::iter::once(id).chain(self.descendants(id)).map(value))
    }
}

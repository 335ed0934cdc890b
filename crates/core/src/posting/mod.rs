//! Posting engine.
//!
//! Converts a validated entry into immutable ledger lines and packages
//! everything the store must write in one atomic commit.

pub mod locks;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, LedgerLineId};

use crate::ledger::{JournalEntry, LedgerError, LedgerLine, Side};

pub use locks::{AccountLocks, PostingGuard};

/// Everything written when a draft is posted.
///
/// The store appends `lines` and replaces the stored entry with `entry`
/// in a single transaction, provided the stored draft still carries
/// `draft_updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingCommit {
    /// The entry in its Posted state.
    pub entry: JournalEntry,
    /// Ledger lines, one per entry line.
    pub lines: Vec<LedgerLine>,
    /// `updated_at` of the draft the lines were prepared from.
    pub draft_updated_at: DateTime<Utc>,
}

/// Everything written when a posted entry is reversed.
///
/// The store inserts `reversal`, appends `lines` for it, and replaces the
/// stored original with `original` in a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalCommit {
    /// The original entry in its Reversed state.
    pub original: JournalEntry,
    /// The new posted reversal entry.
    pub reversal: JournalEntry,
    /// Ledger lines of the reversal entry.
    pub lines: Vec<LedgerLine>,
}

/// Stateless converter from entries to ledger lines.
pub struct PostingEngine;

impl PostingEngine {
    /// Build ledger lines for a posted entry.
    ///
    /// Each line keeps its actual side; `normal_side` is looked up per
    /// account so the signed effect can be derived later.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccount` if an account's normal side cannot be resolved.
    pub fn prepare_lines<N>(
        entry: &JournalEntry,
        posted_at: DateTime<Utc>,
        normal_side: N,
    ) -> Result<Vec<LedgerLine>, LedgerError>
    where
        N: Fn(AccountId) -> Option<Side>,
    {
        entry
            .lines
            .iter()
            .map(|line| {
                let normal = normal_side(line.account_id)
                    .ok_or(LedgerError::UnknownAccount(line.account_id))?;
                Ok(LedgerLine {
                    id: LedgerLineId::new(),
                    entry_id: entry.id,
                    line_no: line.line_no,
                    account_id: line.account_id,
                    side: line.side,
                    amount: line.amount,
                    normal_side: normal,
                    entry_date: entry.entry_date,
                    posted_at,
                    description: line.description.clone(),
                })
            })
            .collect()
    }
}

//! Ledger service for journal entry validation.
//!
//! This module provides the core business logic for validating journal
//! entries before they are stored as drafts or committed to the ledger.

use tally_shared::types::AccountId;

use super::balance::checked_sum;
use super::error::LedgerError;
use super::types::{EntryTotals, JournalLine, JournalLineInput};
use super::validation::shape_lines;

/// Information about an account needed for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Whether the account is active.
    pub is_active: bool,
    /// The account's currency code.
    pub currency: String,
}

/// Ledger service for journal entry validation.
///
/// This service contains pure business logic with no storage dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validate a set of input lines.
    ///
    /// Checks run in this order:
    /// 1. At least two lines
    /// 2. Each line has exactly one positive side
    /// 3. Every account exists and is active
    /// 4. All accounts share one currency
    /// 5. Debit and credit totals fit the decimal range
    /// 6. Debits equal credits
    ///
    /// # Arguments
    ///
    /// * `inputs` - The entry lines
    /// * `account_lookup` - Returns what storage knows about an account
    ///
    /// # Errors
    ///
    /// Returns the first `LedgerError` found.
    pub fn validate_lines<A>(
        inputs: &[JournalLineInput],
        account_lookup: A,
    ) -> Result<(Vec<JournalLine>, EntryTotals), LedgerError>
    where
        A: Fn(AccountId) -> Option<AccountInfo>,
    {
        let lines = shape_lines(inputs)?;

        let mut currency: Option<String> = None;
        for line in &lines {
            let info = account_lookup(line.account_id)
                .filter(|info| info.is_active)
                .ok_or(LedgerError::UnknownAccount(line.account_id))?;

            match &currency {
                None => currency = Some(info.currency),
                Some(expected) if *expected != info.currency => {
                    return Err(LedgerError::CurrencyMismatch {
                        expected: expected.clone(),
                        found: info.currency,
                    });
                }
                Some(_) => {}
            }
        }

        let totals = Self::calculate_totals(&lines)?;
        if !totals.is_balanced {
            return Err(LedgerError::UnbalancedEntry {
                debit: totals.debit,
                credit: totals.credit,
            });
        }

        Ok((lines, totals))
    }

    /// Calculate entry totals from validated lines.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if either side's total leaves the decimal range.
    pub fn calculate_totals(lines: &[JournalLine]) -> Result<EntryTotals, LedgerError> {
        let debit = checked_sum(lines.iter().map(JournalLine::debit))?;
        let credit = checked_sum(lines.iter().map(JournalLine::credit))?;
        Ok(EntryTotals::new(debit, credit))
    }
}

//! Account balance calculations over ledger lines.
//!
//! Balances are always folded from posted lines; nothing here is stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::types::{LedgerLine, Side};

/// `a + b`, or `AmountOverflow`.
///
/// # Errors
///
/// Returns `AmountOverflow` if the sum leaves the decimal range.
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::AmountOverflow)
}

/// `a - b`, or `AmountOverflow`.
///
/// # Errors
///
/// Returns `AmountOverflow` if the difference leaves the decimal range.
pub fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, LedgerError> {
    a.checked_sub(b).ok_or(LedgerError::AmountOverflow)
}

/// Sums amounts without panicking on overflow.
///
/// # Errors
///
/// Returns `AmountOverflow` if a partial sum leaves the decimal range.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, checked_add)
}

/// Debit and credit sums of a set of ledger lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
}

impl BalanceTotals {
    /// Folds lines into totals.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if a side total leaves the decimal range.
    pub fn from_lines<'a, I>(lines: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'a LedgerLine>,
    {
        let mut totals = Self::default();
        for line in lines {
            totals.apply(line)?;
        }
        Ok(totals)
    }

    /// Adds one line.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` and leaves the totals unchanged if the side
    /// total would leave the decimal range.
    pub fn apply(&mut self, line: &LedgerLine) -> Result<(), LedgerError> {
        let total = match line.side {
            Side::Debit => &mut self.debit_total,
            Side::Credit => &mut self.credit_total,
        };
        *total = checked_add(*total, line.amount)?;
        Ok(())
    }

    /// Debit minus credit, independent of account type.
    ///
    /// Both totals are non-negative, so the difference stays in range.
    #[must_use]
    pub fn raw(&self) -> Decimal {
        self.debit_total - self.credit_total
    }

    /// Balance signed against the given normal side.
    ///
    /// - Debit-normal: debit - credit
    /// - Credit-normal: credit - debit
    #[must_use]
    pub fn balance(&self, normal_side: Side) -> Decimal {
        match normal_side {
            Side::Debit => self.debit_total - self.credit_total,
            Side::Credit => self.credit_total - self.debit_total,
        }
    }
}

/// Running balance after one ledger line.
///
/// - previous_balance: balance before this line
/// - current_balance: balance after this line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Number of lines folded so far.
    pub line_count: u64,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Starts a chain from an opening balance with no lines folded yet.
    #[must_use]
    pub fn opening(balance: Decimal) -> Self {
        Self {
            line_count: 0,
            previous_balance: balance,
            current_balance: balance,
        }
    }

    /// Advances the chain by one signed change.
    ///
    /// - current_balance[N] = previous_balance[N] + change
    /// - previous_balance[N] = current_balance[N-1]
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the new balance leaves the decimal range.
    pub fn next(&self, change: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            line_count: self.line_count + 1,
            previous_balance: self.current_balance,
            current_balance: checked_add(self.current_balance, change)?,
        })
    }
}

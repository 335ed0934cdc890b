//! Reconciliation domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ActorId, LedgerLineId, ReconciliationId};

/// One line of an external statement (e.g., a bank statement).
///
/// `amount` is signed the same way as the account's balance: positive
/// increases it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLine {
    /// Date on the external statement.
    pub date: NaiveDate,
    /// Signed amount.
    pub amount: Decimal,
    /// External reference, if any.
    #[serde(default)]
    pub reference: Option<String>,
    /// External description, if any.
    #[serde(default)]
    pub description: Option<String>,
}

impl ExternalLine {
    /// Creates a line without reference or description.
    #[must_use]
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            date,
            amount,
            reference: None,
            description: None,
        }
    }
}

/// Input for reconciling one account against a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileInput {
    /// Account being reconciled.
    pub account_id: AccountId,
    /// Statement cut-off date; ledger lines after it are ignored.
    pub statement_date: NaiveDate,
    /// Statement lines in input order.
    pub external_lines: Vec<ExternalLine>,
    /// Closing balance printed on the statement. Defaults to the sum of lines.
    #[serde(default)]
    pub statement_balance: Option<Decimal>,
}

/// An external line paired with a ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    /// Index of the external line in the input.
    pub external_index: usize,
    /// The matched ledger line.
    pub ledger_line_id: LedgerLineId,
    /// The shared signed amount.
    pub amount: Decimal,
    /// Date on the external statement.
    pub external_date: NaiveDate,
    /// Accounting date of the ledger line.
    pub ledger_date: NaiveDate,
}

/// An external line with no ledger counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedExternal {
    /// Index of the external line in the input.
    pub index: usize,
    /// The line itself.
    pub line: ExternalLine,
}

/// Result of a matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Pairs, ordered by external index.
    pub matched: Vec<MatchedPair>,
    /// External lines left over, ordered by index.
    pub unmatched_external: Vec<UnmatchedExternal>,
    /// Ledger lines left over, in ledger order.
    pub unmatched_ledger: Vec<LedgerLineId>,
}

/// Stored reconciliation snapshot. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Unique identifier.
    pub id: ReconciliationId,
    /// Reconciled account.
    pub account_id: AccountId,
    /// Statement cut-off date.
    pub statement_date: NaiveDate,
    /// Balance according to the statement.
    pub external_balance: Decimal,
    /// Ledger balance as of the statement date.
    pub ledger_balance: Decimal,
    /// `external_balance - ledger_balance`.
    pub discrepancy: Decimal,
    /// Matched pairs.
    pub matched: Vec<MatchedPair>,
    /// External lines with no ledger counterpart.
    pub unmatched_external: Vec<UnmatchedExternal>,
    /// Ledger lines with no external counterpart.
    pub unmatched_ledger: Vec<LedgerLineId>,
    /// Who ran the reconciliation.
    pub created_by: ActorId,
    /// When it was run.
    pub created_at: DateTime<Utc>,
}

impl Reconciliation {
    /// True when balances agree and every line on both sides matched.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.discrepancy.is_zero()
            && self.unmatched_external.is_empty()
            && self.unmatched_ledger.is_empty()
    }
}

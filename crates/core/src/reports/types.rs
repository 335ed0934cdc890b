//! Report data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, LedgerLineId};

use crate::accounts::AccountType;
use crate::ledger::Side;

/// Balance of one account at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Account currency.
    pub currency: String,
    /// Whether the account is active.
    pub is_active: bool,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Balance signed against the account's normal side.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Debit minus credit, independent of account type.
    #[must_use]
    pub fn raw(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// One line of an account statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Ledger line ID.
    pub ledger_line_id: LedgerLineId,
    /// Posted entry ID.
    pub entry_id: JournalEntryId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Commit time.
    pub posted_at: DateTime<Utc>,
    /// Side posted.
    pub side: Side,
    /// Positive amount.
    pub amount: Decimal,
    /// Amount signed against the normal side.
    pub signed_amount: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
    /// Line description.
    pub description: Option<String>,
}

/// Chronological activity of one account over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatement {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Range start (inclusive).
    pub from: NaiveDate,
    /// Range end (inclusive).
    pub to: NaiveDate,
    /// Balance from all lines dated before `from`.
    pub opening_balance: Decimal,
    /// Lines in range with running balance.
    pub lines: Vec<StatementLine>,
    /// Total debits in range.
    pub debit_total: Decimal,
    /// Total credits in range.
    pub credit_total: Decimal,
    /// Opening balance plus in-range activity.
    pub closing_balance: Decimal,
}

/// One row of the trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit column amount.
    pub debit: Decimal,
    /// Credit column amount.
    pub credit: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Rows in account code order.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Balance sheet or income statement section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section total of normal-signed balances.
    pub total: Decimal,
    /// Accounts in this section.
    pub accounts: Vec<AccountBalance>,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheetReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Assets section.
    pub assets: ReportSection,
    /// Liabilities section.
    pub liabilities: ReportSection,
    /// Equity accounts section (excludes current earnings).
    pub equity: ReportSection,
    /// Cumulative revenue minus expense up to `as_of`.
    pub current_earnings: Decimal,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Equity accounts plus current earnings.
    pub total_equity: Decimal,
    /// Liabilities plus equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity.
    pub is_balanced: bool,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementReport {
    /// Period start date (inclusive).
    pub from: NaiveDate,
    /// Period end date (inclusive).
    pub to: NaiveDate,
    /// Currency code.
    pub currency: String,
    /// Revenue section.
    pub revenue: ReportSection,
    /// Expense section.
    pub expenses: ReportSection,
    /// Revenue minus expenses.
    pub net_income: Decimal,
}

/// Balance of an account aggregated over its sub-tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupBalance {
    /// The parent account.
    pub account_id: AccountId,
    /// As of date.
    pub as_of: NaiveDate,
    /// Balance of the account's own lines.
    pub own_balance: Decimal,
    /// Own balance plus every descendant's balance.
    pub total_balance: Decimal,
    /// Descendant balances, depth-first in code order.
    pub descendants: Vec<AccountBalance>,
}

//! Ledger error types.
//!
//! Every failure the engine can report is one variant of [`LedgerError`].
//! Variants are grouped into an [`ErrorKind`] that the boundary layer maps to
//! [`AppError`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::AppError;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;

use super::types::EntryStatus;

/// What is wrong with a single entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineDefect {
    /// A debit or credit amount is below zero.
    Negative,
    /// Both debit and credit are positive.
    BothSides,
    /// Neither debit nor credit is positive.
    NoAmount,
    /// The amount exceeds the largest storable line amount.
    TooLarge,
    /// The amount has more than four decimal places.
    TooPrecise,
}

impl fmt::Display for LineDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negative => "amount cannot be negative",
            Self::BothSides => "line must specify either debit or credit, not both",
            Self::NoAmount => "line must have a positive debit or credit",
            Self::TooLarge => "amount exceeds 999999999999999.9999",
            Self::TooPrecise => "amount cannot have more than 4 decimal places",
        })
    }
}

/// Family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Input rejected before any write.
    Validation,
    /// Operation not legal in the current lifecycle state.
    State,
    /// Referenced entity does not exist.
    NotFound,
    /// A ledger identity does not hold. Fatal.
    Consistency,
    /// Contention or timeout. Retryable.
    Concurrency,
    /// Storage backend failure.
    Storage,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A line has an invalid amount shape.
    #[error("Line {line_no}: {defect}")]
    InvalidLine {
        /// 1-based line number.
        line_no: u32,
        /// What is wrong with the line.
        defect: LineDefect,
    },

    /// A total does not fit in the decimal range.
    #[error("Amount total exceeds the supported range")]
    AmountOverflow,

    /// Lines reference accounts with different currencies.
    #[error("Journal entry mixes currencies {expected} and {found}")]
    CurrencyMismatch {
        /// Currency of the first line's account.
        expected: String,
        /// Conflicting currency.
        found: String,
    },

    /// Account code is empty or malformed.
    #[error("Invalid account code: {0:?}")]
    InvalidAccountCode(String),

    /// Currency is not a three-letter uppercase code.
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Reversal requires a non-empty reason.
    #[error("Reversal reason is required")]
    ReversalReasonRequired,

    /// Range start is after range end.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Range start.
        from: NaiveDate,
        /// Range end.
        to: NaiveDate,
    },

    /// Account code already exists.
    #[error("Account code already exists: {0}")]
    DuplicateCode(String),

    /// Parent account missing or of a different type.
    #[error("Invalid parent account {parent_id}: {reason}")]
    InvalidParent {
        /// The requested parent.
        parent_id: AccountId,
        /// Why the parent was rejected.
        reason: String,
    },

    /// Account is referenced by draft entries.
    #[error("Account {account_id} is referenced by {drafts} draft entries")]
    HasOpenActivity {
        /// The account being deactivated.
        account_id: AccountId,
        /// Number of draft entries referencing it.
        drafts: u64,
    },

    // ========== State Errors ==========
    /// Entry has already been posted.
    #[error("Journal entry {0} is already posted")]
    AlreadyPosted(JournalEntryId),

    /// Entry has already been reversed.
    #[error("Journal entry {0} is already reversed")]
    AlreadyReversed(JournalEntryId),

    /// Entry has not been posted yet.
    #[error("Journal entry {0} is not posted")]
    NotPosted(JournalEntryId),

    /// Entry is not a draft and cannot be modified.
    #[error("Journal entry {id} is {status}, only drafts can be modified")]
    NotDraft {
        /// The entry.
        id: JournalEntryId,
        /// Its current status.
        status: EntryStatus,
    },

    /// Ledger lines for this entry already exist.
    #[error("Ledger lines for journal entry {0} already exist")]
    EntryAlreadyPosted(JournalEntryId),

    /// Account is frozen after a consistency violation.
    #[error("Account {0} is frozen pending investigation")]
    AccountFrozen(AccountId),

    // ========== Not Found Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    NotFound(JournalEntryId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Entry line references a missing or inactive account.
    #[error("Unknown or inactive account: {0}")]
    UnknownAccount(AccountId),

    // ========== Consistency Errors ==========
    /// Trial balance columns disagree.
    #[error("Trial balance as of {as_of} does not balance. Debit: {debit}, Credit: {credit}")]
    TrialBalanceMismatch {
        /// Report date.
        as_of: NaiveDate,
        /// Debit column total.
        debit: Decimal,
        /// Credit column total.
        credit: Decimal,
    },

    /// Balance sheet equation does not hold.
    #[error(
        "Balance sheet as of {as_of} does not balance. Assets: {assets}, Liabilities + Equity: {liabilities_and_equity}"
    )]
    BalanceSheetMismatch {
        /// Report date.
        as_of: NaiveDate,
        /// Total assets.
        assets: Decimal,
        /// Total liabilities plus equity.
        liabilities_and_equity: Decimal,
    },

    // ========== Concurrency Errors ==========
    /// Could not acquire account locks in time.
    #[error("Timed out after {timeout_ms}ms waiting for account locks")]
    PostingTimeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Storage Errors ==========
    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the family this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::UnbalancedEntry { .. }
            | Self::InvalidLine { .. }
            | Self::AmountOverflow
            | Self::CurrencyMismatch { .. }
            | Self::InvalidAccountCode(_)
            | Self::InvalidCurrency(_)
            | Self::ReversalReasonRequired
            | Self::InvalidDateRange { .. }
            | Self::DuplicateCode(_)
            | Self::InvalidParent { .. }
            | Self::HasOpenActivity { .. } => ErrorKind::Validation,

            Self::AlreadyPosted(_)
            | Self::AlreadyReversed(_)
            | Self::NotPosted(_)
            | Self::NotDraft { .. }
            | Self::EntryAlreadyPosted(_)
            | Self::AccountFrozen(_) => ErrorKind::State,

            Self::NotFound(_) | Self::AccountNotFound(_) | Self::UnknownAccount(_) => {
                ErrorKind::NotFound
            }

            Self::TrialBalanceMismatch { .. } | Self::BalanceSheetMismatch { .. } => {
                ErrorKind::Consistency
            }

            Self::PostingTimeout { .. } | Self::ConcurrentModification => ErrorKind::Concurrency,

            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InvalidAccountCode(_) => "INVALID_ACCOUNT_CODE",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::ReversalReasonRequired => "REVERSAL_REASON_REQUIRED",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::InvalidParent { .. } => "INVALID_PARENT",
            Self::HasOpenActivity { .. } => "HAS_OPEN_ACTIVITY",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::NotDraft { .. } => "NOT_DRAFT",
            Self::EntryAlreadyPosted(_) => "ENTRY_ALREADY_POSTED",
            Self::AccountFrozen(_) => "ACCOUNT_FROZEN",
            Self::NotFound(_) => "ENTRY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::TrialBalanceMismatch { .. } => "TRIAL_BALANCE_MISMATCH",
            Self::BalanceSheetMismatch { .. } => "BALANCE_SHEET_MISMATCH",
            Self::PostingTimeout { .. } => "POSTING_TIMEOUT",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Concurrency)
    }

    /// Returns true if this error signals a broken ledger identity.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Consistency)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::State => Self::State(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Consistency => Self::Consistency(message),
            ErrorKind::Concurrency => Self::Concurrency(message),
            ErrorKind::Storage => Self::Database(message),
        }
    }
}

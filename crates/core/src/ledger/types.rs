//! Ledger domain types for journal entries and posted ledger lines.
//!
//! This module defines the core types that flow through the entry
//! lifecycle, the posting engine, and the ledger store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{AccountId, ActorId, JournalEntryId, LedgerLineId};

use super::{LedgerError, LedgerService};

/// Side of a double-entry line: either Debit or Credit.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl Side {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the string representation of the side.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a side from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Journal entry status.
///
/// The valid transitions are:
/// - Draft → Posted (post)
/// - Posted → Reversed (reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted and can be modified or deleted.
    Draft,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry has been reversed by a sibling entry (terminal).
    Reversed,
}

impl EntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "posted" => Some(Self::Posted),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Returns true if the entry can be modified.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry has ledger effect.
    #[must_use]
    pub const fn is_posted(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for a single line of a journal entry.
///
/// Exactly one of `debit` and `credit` must be positive; the other must be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero if credit line).
    #[serde(default)]
    pub debit: Decimal,
    /// Credit amount (zero if debit line).
    #[serde(default)]
    pub credit: Decimal,
    /// Optional line description.
    #[serde(default)]
    pub description: Option<String>,
}

impl JournalLineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Attaches a description to the line.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for creating a new journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryInput {
    /// Accounting date of the entry.
    pub entry_date: NaiveDate,
    /// Human reference (e.g., voucher number).
    pub reference: String,
    /// Free-text description.
    pub description: String,
    /// The entry lines (must have at least 2).
    pub lines: Vec<JournalLineInput>,
}

/// Patch for a draft journal entry. `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEntryInput {
    /// New accounting date.
    pub entry_date: Option<NaiveDate>,
    /// New reference.
    pub reference: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement line set.
    pub lines: Option<Vec<JournalLineInput>>,
}

/// A validated line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// 1-based position within the entry.
    pub line_no: u32,
    /// The account affected by this line.
    pub account_id: AccountId,
    /// Whether this is a debit or credit.
    pub side: Side,
    /// Positive amount.
    pub amount: Decimal,
    /// Optional line description.
    pub description: Option<String>,
}

impl JournalLine {
    /// Returns the debit amount (zero for a credit line).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => Decimal::ZERO,
        }
    }

    /// Returns the credit amount (zero for a debit line).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        match self.side {
            Side::Debit => Decimal::ZERO,
            Side::Credit => self.amount,
        }
    }
}

/// A journal entry document (header and lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Human reference.
    pub reference: String,
    /// Free-text description.
    pub description: String,
    /// Current status.
    pub status: EntryStatus,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Who created the entry.
    pub created_by: ActorId,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last changed.
    pub updated_at: DateTime<Utc>,
    /// When the entry was posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// Who posted the entry.
    pub posted_by: Option<ActorId>,
    /// The entry this one reverses, if it is a reversal.
    pub reversal_of: Option<JournalEntryId>,
    /// The entry that reversed this one.
    pub reversed_by: Option<JournalEntryId>,
    /// Why this entry was reversed.
    pub reversal_reason: Option<String>,
    /// When this entry was reversed.
    pub reversed_at: Option<DateTime<Utc>>,
    /// Who reversed this entry.
    pub reversed_by_actor: Option<ActorId>,
}

impl JournalEntry {
    /// Creates a new draft entry from validated lines.
    #[must_use]
    pub fn draft(
        entry_date: NaiveDate,
        reference: String,
        description: String,
        lines: Vec<JournalLine>,
        created_by: ActorId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JournalEntryId::new(),
            entry_date,
            reference,
            description,
            status: EntryStatus::Draft,
            lines,
            created_by,
            created_at: now,
            updated_at: now,
            posted_at: None,
            posted_by: None,
            reversal_of: None,
            reversed_by: None,
            reversal_reason: None,
            reversed_at: None,
            reversed_by_actor: None,
        }
    }

    /// Returns the debit and credit totals of the entry.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if a column total leaves the decimal range.
    pub fn totals(&self) -> Result<EntryTotals, LedgerError> {
        LedgerService::calculate_totals(&self.lines)
    }

    /// Returns the distinct accounts referenced by the entry, sorted by id.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.lines.iter().map(|l| l.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// An immutable posted fact against one account.
///
/// Produced one-to-one from a posted entry's lines; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    /// Unique identifier.
    pub id: LedgerLineId,
    /// The posted entry this line belongs to.
    pub entry_id: JournalEntryId,
    /// Position of the source line within the entry.
    pub line_no: u32,
    /// The account affected.
    pub account_id: AccountId,
    /// The side the amount was posted on.
    pub side: Side,
    /// Positive amount.
    pub amount: Decimal,
    /// Normal side of the account at posting time (fixed by account type).
    pub normal_side: Side,
    /// Accounting date (the entry date).
    pub entry_date: NaiveDate,
    /// When the line was committed.
    pub posted_at: DateTime<Utc>,
    /// Line description carried over from the entry.
    pub description: Option<String>,
}

impl LedgerLine {
    /// Returns the amount signed against the account's normal side.
    ///
    /// Positive when the line increases the account's balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        if self.side == self.normal_side {
            self.amount
        } else {
            -self.amount
        }
    }

    /// Returns the amount signed debit-positive, independent of account type.
    #[must_use]
    pub fn debit_signed_amount(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => -self.amount,
        }
    }

    /// Returns the debit amount (zero for a credit line).
    #[must_use]
    pub fn debit(&self) -> Decimal {
        match self.side {
            Side::Debit => self.amount,
            Side::Credit => Decimal::ZERO,
        }
    }

    /// Returns the credit amount (zero for a debit line).
    #[must_use]
    pub fn credit(&self) -> Decimal {
        match self.side {
            Side::Debit => Decimal::ZERO,
            Side::Credit => self.amount,
        }
    }

    /// Key that orders lines chronologically: accounting date, commit time, entry, line.
    #[must_use]
    pub fn ledger_order_key(&self) -> (NaiveDate, DateTime<Utc>, JournalEntryId, u32) {
        (self.entry_date, self.posted_at, self.entry_id, self.line_no)
    }
}

/// Entry totals for validation and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Total debit amount.
    pub debit: Decimal,
    /// Total credit amount.
    pub credit: Decimal,
    /// Whether the entry is balanced (debits == credits).
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates new totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal entry and ledger line types
//! - Line and entry validation
//! - Balance folding over posted lines
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{BalanceTotals, RunningBalance, checked_add, checked_sub, checked_sum};
pub use error::{ErrorKind, LedgerError, LineDefect};
pub use service::{AccountInfo, LedgerService};
pub use types::{
    CreateEntryInput, EntryStatus, EntryTotals, JournalEntry, JournalLine, JournalLineInput,
    LedgerLine, Side, UpdateEntryInput,
};
pub use validation::{MAX_LINE_AMOUNT, MAX_LINE_SCALE};

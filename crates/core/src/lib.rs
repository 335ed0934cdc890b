//! Core business logic for Tally.
//!
//! This crate contains the double-entry ledger engine with ZERO web or
//! database dependencies. Storage is reached through the traits in
//! [`store`]; an in-memory backend ships with the crate.
//!
//! # Modules
//!
//! - `accounts` - Chart of accounts, normal sides, hierarchy
//! - `ledger` - Entry and ledger line types, validation, balances
//! - `workflow` - Entry lifecycle transitions and reversals
//! - `posting` - Ledger line preparation and per-account locks
//! - `reports` - Balances, statements, trial balance, balance sheet, income statement
//! - `reconciliation` - Matching external statements against the ledger
//! - `store` - Storage traits and the in-memory backend
//! - `engine` - The async `LedgerEngine` tying it all together

pub mod accounts;
pub mod engine;
pub mod ledger;
pub mod posting;
pub mod reconciliation;
pub mod reports;
pub mod store;
pub mod workflow;

pub use engine::{FreezeRecord, LedgerEngine, ReversalResult};
pub use ledger::{ErrorKind, LedgerError};

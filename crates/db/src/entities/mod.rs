//! `SeaORM` entities for the ledger tables.

pub mod prelude;

pub mod accounts;
pub mod journal_entries;
pub mod journal_lines;
pub mod ledger_lines;
pub mod reconciliations;
pub mod sea_orm_active_enums;

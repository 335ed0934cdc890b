//! Financial report generation.
//!
//! This module provides pure business logic for generating financial reports:
//! - Account balance and statement
//! - Trial Balance
//! - Balance Sheet
//! - Income Statement
//! - Hierarchy roll-up

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use service::ReportService;
pub use types::*;

//! Chart of accounts types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{AccountId, ActorId};

use crate::ledger::Side;

/// The five account types of the accounting equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (debit-normal).
    Asset,
    /// Obligations owed (credit-normal).
    Liability,
    /// Owner's residual interest (credit-normal).
    Equity,
    /// Income earned (credit-normal).
    Revenue,
    /// Costs incurred (debit-normal).
    Expense,
}

impl AccountType {
    /// All account types in statement order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the string representation of the account type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Returns the side on which this account type's balance increases.
    #[must_use]
    pub const fn normal_side(self) -> Side {
        resolve_normal_side(self)
    }

    /// Returns true for balance sheet types.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the normal balance side of an account type.
///
/// - Asset/Expense: Debit
/// - Liability/Equity/Revenue: Credit
#[must_use]
pub const fn resolve_normal_side(account_type: AccountType) -> Side {
    match account_type {
        AccountType::Asset | AccountType::Expense => Side::Debit,
        AccountType::Liability | AccountType::Equity | AccountType::Revenue => Side::Credit,
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Unique, sortable account code (e.g., "1000").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Account type, fixed for the account's lifetime.
    pub account_type: AccountType,
    /// Parent account in the hierarchy.
    pub parent_id: Option<AccountId>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Whether new entries may reference the account.
    pub is_active: bool,
    /// Who created the account.
    pub created_by: ActorId,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns the normal balance side of the account.
    #[must_use]
    pub const fn normal_side(&self) -> Side {
        self.account_type.normal_side()
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountInput {
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Account type.
    pub account_type: AccountType,
    /// Optional parent account.
    #[serde(default)]
    pub parent_id: Option<AccountId>,
    /// ISO 4217 currency code.
    pub currency: String,
}

impl CreateAccountInput {
    /// Creates a top-level account input without description.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            account_type,
            parent_id: None,
            currency: currency.into(),
        }
    }

    /// Places the account under a parent.
    #[must_use]
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AccountType::Asset, Side::Debit)]
    #[case(AccountType::Expense, Side::Debit)]
    #[case(AccountType::Liability, Side::Credit)]
    #[case(AccountType::Equity, Side::Credit)]
    #[case(AccountType::Revenue, Side::Credit)]
    fn test_normal_side(#[case] account_type: AccountType, #[case] side: Side) {
        assert_eq!(resolve_normal_side(account_type), side);
        assert_eq!(account_type.normal_side(), side);
    }

    #[test]
    fn test_parse_round_trip() {
        for t in AccountType::ALL {
            assert_eq!(AccountType::parse(t.as_str()), Some(t));
        }
        assert_eq!(AccountType::parse("ASSET"), Some(AccountType::Asset));
        assert_eq!(AccountType::parse("contra"), None);
    }

    #[test]
    fn test_balance_sheet_types() {
        assert!(AccountType::Asset.is_balance_sheet());
        assert!(AccountType::Equity.is_balance_sheet());
        assert!(!AccountType::Revenue.is_balance_sheet());
        assert!(!AccountType::Expense.is_balance_sheet());
    }
}

//! Validation rules for the chart of accounts.

use tally_shared::types::AccountId;

use super::types::{Account, CreateAccountInput};
use crate::ledger::LedgerError;

/// Account registry rules.
///
/// Stateless; callers supply what storage knows about existing accounts.
pub struct AccountRegistry;

impl AccountRegistry {
    /// Validates a new account against its parent.
    ///
    /// # Errors
    ///
    /// - `InvalidAccountCode` for an empty or whitespace code
    /// - `InvalidCurrency` unless the currency is three uppercase ASCII letters
    /// - `InvalidParent` if the parent is missing or has a different type
    pub fn validate_new(
        input: &CreateAccountInput,
        parent: Option<&Account>,
    ) -> Result<(), LedgerError> {
        Self::validate_code(&input.code)?;
        Self::validate_currency(&input.currency)?;

        if let Some(parent_id) = input.parent_id {
            let parent = parent.ok_or_else(|| LedgerError::InvalidParent {
                parent_id,
                reason: "parent account does not exist".to_string(),
            })?;
            if parent.account_type != input.account_type {
                return Err(LedgerError::InvalidParent {
                    parent_id,
                    reason: format!(
                        "parent is {} but child is {}",
                        parent.account_type, input.account_type
                    ),
                });
            }
        }
        Ok(())
    }

    /// Validates an account code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountCode` if the code is empty or contains whitespace.
    pub fn validate_code(code: &str) -> Result<(), LedgerError> {
        if code.is_empty() || code.chars().any(char::is_whitespace) {
            return Err(LedgerError::InvalidAccountCode(code.to_string()));
        }
        Ok(())
    }

    /// Validates an ISO 4217 currency code shape.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCurrency` unless the code is three uppercase letters.
    pub fn validate_currency(currency: &str) -> Result<(), LedgerError> {
        if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(())
        } else {
            Err(LedgerError::InvalidCurrency(currency.to_string()))
        }
    }

    /// Checks that an account may be deactivated.
    ///
    /// Posted history never blocks deactivation; open drafts do.
    ///
    /// # Errors
    ///
    /// Returns `HasOpenActivity` if any draft references the account.
    pub fn ensure_can_deactivate(account_id: AccountId, drafts: u64) -> Result<(), LedgerError> {
        if drafts > 0 {
            return Err(LedgerError::HasOpenActivity { account_id, drafts });
        }
        Ok(())
    }
}

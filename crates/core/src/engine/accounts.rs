//! Chart of accounts operations.

use chrono::Utc;
use tally_shared::types::{AccountId, ActorId};
use tracing::info;

use super::LedgerEngine;
use crate::accounts::{Account, AccountRegistry, AccountTree, CreateAccountInput};
use crate::ledger::LedgerError;
use crate::store::Storage;

impl<S> LedgerEngine<S>
where
    S: Storage + 'static,
{
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// `InvalidAccountCode`, `InvalidCurrency`, `InvalidParent` or
    /// `DuplicateCode`.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
        actor: ActorId,
    ) -> Result<Account, LedgerError> {
        let parent = match input.parent_id {
            Some(parent_id) => self.store.get_account(parent_id).await?,
            None => None,
        };
        AccountRegistry::validate_new(&input, parent.as_ref())?;

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            code: input.code,
            name: input.name,
            description: input.description,
            account_type: input.account_type,
            parent_id: input.parent_id,
            currency: input.currency,
            is_active: true,
            created_by: actor,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_account(&account).await?;

        info!(
            account_id = %account.id,
            code = %account.code,
            account_type = %account.account_type,
            actor = %actor,
            "Account created"
        );
        Ok(account)
    }

    /// Re-enables an account for new entries.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub async fn activate_account(
        &self,
        id: AccountId,
        actor: ActorId,
    ) -> Result<Account, LedgerError> {
        let account = self.store.set_account_active(id, true, Utc::now()).await?;
        info!(account_id = %id, actor = %actor, "Account activated");
        Ok(account)
    }

    /// Blocks an account from new entries. Posted history stays.
    ///
    /// The account is held while drafts are counted and the flag flips, the
    /// same lock `create_entry` and `update_entry` take for their lines.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` for an unknown id, `HasOpenActivity` while draft
    /// entries reference the account, `PostingTimeout` if the account is
    /// busy.
    pub async fn deactivate_account(
        &self,
        id: AccountId,
        actor: ActorId,
    ) -> Result<Account, LedgerError> {
        self.require_account(id).await?;
        let _guard = self.lock_accounts(&[id]).await?;
        let drafts = self.store.count_drafts_for_account(id).await?;
        AccountRegistry::ensure_can_deactivate(id, drafts)?;

        let account = self.store.set_account_active(id, false, Utc::now()).await?;
        info!(account_id = %id, actor = %actor, "Account deactivated");
        Ok(account)
    }

    /// Loads one account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.require_account(id).await
    }

    /// Lists every account in code order.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.list_accounts().await
    }

    /// Builds the account hierarchy.
    pub async fn account_tree(&self) -> Result<AccountTree, LedgerError> {
        Ok(AccountTree::build(&self.store.list_accounts().await?))
    }
}

//! Balances and financial statements, recomputed from ledger lines.

use chrono::NaiveDate;
use tally_shared::types::AccountId;

use super::LedgerEngine;
use crate::accounts::AccountTree;
use crate::ledger::LedgerError;
use crate::reports::{
    AccountBalance, AccountStatement, BalanceSheetReport, IncomeStatementReport, ReportService,
    RollupBalance, TrialBalanceReport,
};
use crate::store::{LineRange, Storage};

impl<S> LedgerEngine<S>
where
    S: Storage + 'static,
{
    /// Balance of one account from lines dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn balance(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let account = self.require_account(account_id).await?;
        let lines = self
            .store
            .lines_for_account(account_id, LineRange::as_of(as_of))
            .await?;
        ReportService::account_balance(&account, &lines)
    }

    /// Opening balance, lines with running balance, and closing balance.
    ///
    /// # Errors
    ///
    /// `InvalidDateRange` if `from > to`, `AccountNotFound` for an unknown account.
    pub async fn statement(
        &self,
        account_id: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AccountStatement, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidDateRange { from, to });
        }
        let account = self.require_account(account_id).await?;
        let opening = self
            .store
            .lines_for_account(account_id, LineRange::before(from))
            .await?;
        let in_range = self
            .store
            .lines_for_account(account_id, LineRange::between(from, to))
            .await?;
        ReportService::statement(&account, &opening, &in_range, from, to)
    }

    async fn balances_as_of(&self, as_of: NaiveDate) -> Result<Vec<AccountBalance>, LedgerError> {
        let accounts = self.store.list_accounts().await?;
        let lines = self.store.lines_in_range(LineRange::as_of(as_of)).await?;
        ReportService::balances_by_account(&accounts, &lines)
    }

    /// Trial balance as of a date.
    ///
    /// # Errors
    ///
    /// Returns `TrialBalanceMismatch` if the columns disagree; the accounts
    /// carrying a balance are frozen.
    pub async fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalanceReport, LedgerError> {
        let balances = self.balances_as_of(as_of).await?;
        let report = ReportService::generate_trial_balance(
            &balances,
            as_of,
            &self.config.functional_currency,
        )?;
        if !report.totals.is_balanced {
            let violation = LedgerError::TrialBalanceMismatch {
                as_of,
                debit: report.totals.total_debit,
                credit: report.totals.total_credit,
            };
            self.freeze(&Self::carrying_balance(&balances), &violation);
            return Err(violation);
        }
        Ok(report)
    }

    /// Balance sheet as of a date, with current earnings in equity.
    ///
    /// # Errors
    ///
    /// Returns `BalanceSheetMismatch` if assets differ from liabilities plus
    /// equity; the accounts carrying a balance are frozen.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheetReport, LedgerError> {
        let balances = self.balances_as_of(as_of).await?;
        let report = ReportService::generate_balance_sheet(
            &balances,
            as_of,
            &self.config.functional_currency,
        )?;
        if !report.is_balanced {
            let violation = LedgerError::BalanceSheetMismatch {
                as_of,
                assets: report.total_assets,
                liabilities_and_equity: report.liabilities_and_equity,
            };
            self.freeze(&Self::carrying_balance(&balances), &violation);
            return Err(violation);
        }
        Ok(report)
    }

    /// Revenue, expenses and net income over lines dated within `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `from > to`.
    pub async fn income_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<IncomeStatementReport, LedgerError> {
        if from > to {
            return Err(LedgerError::InvalidDateRange { from, to });
        }
        let accounts = self.store.list_accounts().await?;
        let lines = self.store.lines_in_range(LineRange::between(from, to)).await?;
        let balances = ReportService::balances_by_account(&accounts, &lines)?;
        ReportService::generate_income_statement(
            &balances,
            from,
            to,
            &self.config.functional_currency,
        )
    }

    /// Balance of an account plus all its descendants.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn rollup_balance(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<RollupBalance, LedgerError> {
        let accounts = self.store.list_accounts().await?;
        let tree = AccountTree::build(&accounts);
        if !tree.contains(account_id) {
            return Err(LedgerError::AccountNotFound(account_id));
        }
        let lines = self.store.lines_in_range(LineRange::as_of(as_of)).await?;
        let balances = ReportService::balances_by_account(&accounts, &lines)?;
        ReportService::rollup(&tree, &balances, account_id, as_of)?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    fn carrying_balance(balances: &[AccountBalance]) -> Vec<AccountId> {
        balances
            .iter()
            .filter(|b| !b.raw().is_zero())
            .map(|b| b.account_id)
            .collect()
    }
}

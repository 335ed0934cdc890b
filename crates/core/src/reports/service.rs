//! Report generation service.
//!
//! Pure folds from accounts and ledger lines to report structures. Callers
//! load the lines; nothing here keeps state between calls. Every total is
//! accumulated with checked arithmetic and fails with `AmountOverflow`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tally_shared::types::AccountId;

use super::types::{
    AccountBalance, AccountStatement, BalanceSheetReport, IncomeStatementReport, ReportSection,
    RollupBalance, StatementLine, TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals,
};
use crate::accounts::{Account, AccountTree, AccountType};
use crate::ledger::{
    BalanceTotals, LedgerError, LedgerLine, RunningBalance, checked_add, checked_sub, checked_sum,
};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Computes one account's balance from its lines.
    ///
    /// Lines belonging to other accounts are ignored.
    pub fn account_balance(
        account: &Account,
        lines: &[LedgerLine],
    ) -> Result<AccountBalance, LedgerError> {
        let totals =
            BalanceTotals::from_lines(lines.iter().filter(|l| l.account_id == account.id))?;
        Ok(Self::balance_from_totals(account, totals))
    }

    /// Computes a balance for every account from a mixed set of lines.
    ///
    /// Output follows the order of `accounts`.
    pub fn balances_by_account(
        accounts: &[Account],
        lines: &[LedgerLine],
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        let mut totals: HashMap<AccountId, BalanceTotals> = HashMap::new();
        for line in lines {
            totals.entry(line.account_id).or_default().apply(line)?;
        }
        Ok(accounts
            .iter()
            .map(|account| {
                let t = totals.get(&account.id).copied().unwrap_or_default();
                Self::balance_from_totals(account, t)
            })
            .collect())
    }

    fn balance_from_totals(account: &Account, totals: BalanceTotals) -> AccountBalance {
        AccountBalance {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            currency: account.currency.clone(),
            is_active: account.is_active,
            debit_total: totals.debit_total,
            credit_total: totals.credit_total,
            balance: totals.balance(account.normal_side()),
        }
    }

    /// Builds an account statement.
    ///
    /// `opening_lines` are the account's lines dated before `from`;
    /// `range_lines` are its lines within `[from, to]` in ledger order.
    pub fn statement(
        account: &Account,
        opening_lines: &[LedgerLine],
        range_lines: &[LedgerLine],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AccountStatement, LedgerError> {
        let opening_balance = Self::account_balance(account, opening_lines)?.balance;

        let mut running = RunningBalance::opening(opening_balance);
        let mut debit_total = Decimal::ZERO;
        let mut credit_total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(range_lines.len());

        for line in range_lines.iter().filter(|l| l.account_id == account.id) {
            let signed = line.signed_amount();
            running = running.next(signed)?;
            debit_total = checked_add(debit_total, line.debit())?;
            credit_total = checked_add(credit_total, line.credit())?;
            lines.push(StatementLine {
                ledger_line_id: line.id,
                entry_id: line.entry_id,
                entry_date: line.entry_date,
                posted_at: line.posted_at,
                side: line.side,
                amount: line.amount,
                signed_amount: signed,
                running_balance: running.current_balance,
                description: line.description.clone(),
            });
        }

        Ok(AccountStatement {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            from,
            to,
            opening_balance,
            lines,
            debit_total,
            credit_total,
            closing_balance: running.current_balance,
        })
    }

    /// Returns true if an account belongs on the trial balance and balance sheet.
    ///
    /// Active accounts always appear; inactive ones only while they carry a balance.
    #[must_use]
    pub fn is_reported(balance: &AccountBalance) -> bool {
        balance.is_active || !balance.raw().is_zero()
    }

    /// Generates a trial balance report from account balances.
    ///
    /// A positive raw balance (debit - credit) goes in the debit column,
    /// a negative one in the credit column.
    pub fn generate_trial_balance(
        balances: &[AccountBalance],
        as_of: NaiveDate,
        currency: &str,
    ) -> Result<TrialBalanceReport, LedgerError> {
        let rows: Vec<TrialBalanceRow> = balances
            .iter()
            .filter(|b| Self::is_reported(b))
            .map(|b| {
                let raw = b.raw();
                let (debit, credit) = if raw > Decimal::ZERO {
                    (raw, Decimal::ZERO)
                } else {
                    (Decimal::ZERO, -raw)
                };
                TrialBalanceRow {
                    account_id: b.account_id,
                    code: b.code.clone(),
                    name: b.name.clone(),
                    account_type: b.account_type,
                    debit,
                    credit,
                }
            })
            .collect();

        let total_debit = checked_sum(rows.iter().map(|r| r.debit))?;
        let total_credit = checked_sum(rows.iter().map(|r| r.credit))?;

        Ok(TrialBalanceReport {
            as_of,
            currency: currency.to_string(),
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        })
    }

    /// Generates a balance sheet report from account balances.
    ///
    /// Revenue and expense balances are folded into equity as current
    /// earnings. The balance sheet verifies Assets = Liabilities + Equity.
    pub fn generate_balance_sheet(
        balances: &[AccountBalance],
        as_of: NaiveDate,
        currency: &str,
    ) -> Result<BalanceSheetReport, LedgerError> {
        let mut assets = ReportSection::default();
        let mut liabilities = ReportSection::default();
        let mut equity = ReportSection::default();
        let mut current_earnings = Decimal::ZERO;

        for balance in balances.iter().filter(|b| Self::is_reported(b)) {
            match balance.account_type {
                AccountType::Asset => Self::add_to_section(&mut assets, balance)?,
                AccountType::Liability => Self::add_to_section(&mut liabilities, balance)?,
                AccountType::Equity => Self::add_to_section(&mut equity, balance)?,
                AccountType::Revenue => {
                    current_earnings = checked_add(current_earnings, balance.balance)?;
                }
                AccountType::Expense => {
                    current_earnings = checked_sub(current_earnings, balance.balance)?;
                }
            }
        }

        let total_assets = assets.total;
        let total_liabilities = liabilities.total;
        let total_equity = checked_add(equity.total, current_earnings)?;
        let liabilities_and_equity = checked_add(total_liabilities, total_equity)?;

        Ok(BalanceSheetReport {
            as_of,
            currency: currency.to_string(),
            assets,
            liabilities,
            equity,
            current_earnings,
            total_assets,
            total_liabilities,
            total_equity,
            liabilities_and_equity,
            is_balanced: total_assets == liabilities_and_equity,
        })
    }

    /// Generates an income statement from balances over a period.
    ///
    /// `balances` must be computed from lines dated within `[from, to]` only.
    pub fn generate_income_statement(
        balances: &[AccountBalance],
        from: NaiveDate,
        to: NaiveDate,
        currency: &str,
    ) -> Result<IncomeStatementReport, LedgerError> {
        let mut revenue = ReportSection::default();
        let mut expenses = ReportSection::default();

        for balance in balances.iter().filter(|b| Self::is_reported(b)) {
            match balance.account_type {
                AccountType::Revenue => Self::add_to_section(&mut revenue, balance)?,
                AccountType::Expense => Self::add_to_section(&mut expenses, balance)?,
                AccountType::Asset | AccountType::Liability | AccountType::Equity => {}
            }
        }

        let net_income = checked_sub(revenue.total, expenses.total)?;

        Ok(IncomeStatementReport {
            from,
            to,
            currency: currency.to_string(),
            revenue,
            expenses,
            net_income,
        })
    }

    /// Aggregates an account's balance over its sub-tree.
    ///
    /// Returns `None` if `account_id` has no balance in `balances`.
    pub fn rollup(
        tree: &AccountTree,
        balances: &[AccountBalance],
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<Option<RollupBalance>, LedgerError> {
        let by_id: HashMap<AccountId, &AccountBalance> =
            balances.iter().map(|b| (b.account_id, b)).collect();
        let Some(own) = by_id.get(&account_id) else {
            return Ok(None);
        };
        let own_balance = own.balance;

        let descendants: Vec<AccountBalance> = tree
            .descendants(account_id)
            .into_iter()
            .filter_map(|id| by_id.get(&id).map(|b| (*b).clone()))
            .collect();
        let total_balance =
            tree.rollup(account_id, |id| by_id.get(&id).map_or(Decimal::ZERO, |b| b.balance))?;

        Ok(Some(RollupBalance {
            account_id,
            as_of,
            own_balance,
            total_balance,
            descendants,
        }))
    }

    fn add_to_section(
        section: &mut ReportSection,
        balance: &AccountBalance,
    ) -> Result<(), LedgerError> {
        section.total = checked_add(section.total, balance.balance)?;
        section.accounts.push(balance.clone());
        Ok(())
    }
}

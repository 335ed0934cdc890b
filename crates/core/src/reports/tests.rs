//! Tests for the reports module.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, ActorId, JournalEntryId, LedgerLineId};

use super::service::ReportService;
use crate::accounts::{Account, AccountTree, AccountType};
use crate::ledger::{LedgerError, LedgerLine, Side};

fn account(code: &str, account_type: AccountType) -> Account {
    let now = Utc::now();
    Account {
        id: AccountId::new(),
        code: code.to_string(),
        name: format!("Account {code}"),
        description: None,
        account_type,
        parent_id: None,
        currency: "USD".to_string(),
        is_active: true,
        created_by: ActorId::new(),
        created_at: now,
        updated_at: now,
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

/// Two balanced ledger lines for one posting.
fn posting(
    date: NaiveDate,
    debit: &Account,
    credit: &Account,
    amount: Decimal,
) -> Vec<LedgerLine> {
    let entry_id = JournalEntryId::new();
    let posted_at = Utc::now();
    [(1, debit, Side::Debit), (2, credit, Side::Credit)]
        .into_iter()
        .map(|(line_no, account, side)| LedgerLine {
            id: LedgerLineId::new(),
            entry_id,
            line_no,
            account_id: account.id,
            side,
            amount,
            normal_side: account.normal_side(),
            entry_date: date,
            posted_at,
            description: None,
        })
        .collect()
}

#[test]
fn test_cash_revenue_example() {
    let cash = account("1000", AccountType::Asset);
    let revenue = account("4000", AccountType::Revenue);
    let accounts = vec![cash.clone(), revenue.clone()];
    let lines = posting(day(1), &cash, &revenue, dec!(1000));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    assert_eq!(balances[0].balance, dec!(1000));
    assert_eq!(balances[1].balance, dec!(1000));

    let tb = ReportService::generate_trial_balance(&balances, day(31), "USD").unwrap();
    assert_eq!(tb.rows[0].debit, dec!(1000));
    assert_eq!(tb.rows[1].credit, dec!(1000));
    assert_eq!(tb.totals.total_debit, dec!(1000));
    assert_eq!(tb.totals.total_credit, dec!(1000));
    assert!(tb.totals.is_balanced);
}

#[test]
fn test_balance_sheet_includes_current_earnings() {
    let cash = account("1000", AccountType::Asset);
    let loan = account("2000", AccountType::Liability);
    let capital = account("3000", AccountType::Equity);
    let revenue = account("4000", AccountType::Revenue);
    let rent = account("5000", AccountType::Expense);
    let accounts = vec![
        cash.clone(),
        loan.clone(),
        capital.clone(),
        revenue.clone(),
        rent.clone(),
    ];

    let mut lines = posting(day(1), &cash, &capital, dec!(5000));
    lines.extend(posting(day(2), &cash, &loan, dec!(2000)));
    lines.extend(posting(day(3), &cash, &revenue, dec!(1200)));
    lines.extend(posting(day(4), &rent, &cash, dec!(700)));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    let bs = ReportService::generate_balance_sheet(&balances, day(31), "USD").unwrap();

    assert_eq!(bs.total_assets, dec!(7500));
    assert_eq!(bs.total_liabilities, dec!(2000));
    assert_eq!(bs.current_earnings, dec!(500));
    assert_eq!(bs.total_equity, dec!(5500));
    assert!(bs.is_balanced);
}

#[test]
fn test_income_statement_net_income() {
    let cash = account("1000", AccountType::Asset);
    let revenue = account("4000", AccountType::Revenue);
    let rent = account("5000", AccountType::Expense);
    let accounts = vec![cash.clone(), revenue.clone(), rent.clone()];

    let mut lines = posting(day(3), &cash, &revenue, dec!(1200));
    lines.extend(posting(day(4), &rent, &cash, dec!(700)));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    let is = ReportService::generate_income_statement(&balances, day(1), day(31), "USD").unwrap();
    assert_eq!(is.revenue.total, dec!(1200));
    assert_eq!(is.expenses.total, dec!(700));
    assert_eq!(is.net_income, dec!(500));
    assert!(is.revenue.accounts.iter().all(|a| a.account_type == AccountType::Revenue));
}

#[test]
fn test_trial_balance_skips_inactive_zero_accounts() {
    let cash = account("1000", AccountType::Asset);
    let revenue = account("4000", AccountType::Revenue);
    let mut dormant = account("1900", AccountType::Asset);
    dormant.is_active = false;
    let mut closed_with_balance = account("1800", AccountType::Asset);
    closed_with_balance.is_active = false;

    let accounts = vec![
        cash.clone(),
        closed_with_balance.clone(),
        dormant.clone(),
        revenue.clone(),
    ];
    let mut lines = posting(day(1), &cash, &revenue, dec!(10));
    lines.extend(posting(day(2), &closed_with_balance, &revenue, dec!(5)));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    let tb = ReportService::generate_trial_balance(&balances, day(31), "USD").unwrap();
    let ids: Vec<AccountId> = tb.rows.iter().map(|r| r.account_id).collect();
    assert!(ids.contains(&closed_with_balance.id));
    assert!(!ids.contains(&dormant.id));
    assert!(tb.totals.is_balanced);
}

#[test]
fn test_contra_balance_goes_to_credit_column() {
    let cash = account("1000", AccountType::Asset);
    let payable = account("2000", AccountType::Liability);
    let accounts = vec![cash.clone(), payable.clone()];
    // Overdraft: cash credited beyond zero.
    let lines = posting(day(1), &payable, &cash, dec!(300));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    assert_eq!(balances[0].balance, dec!(-300));
    let tb = ReportService::generate_trial_balance(&balances, day(31), "USD").unwrap();
    assert_eq!(tb.rows[0].credit, dec!(300));
    assert_eq!(tb.rows[0].debit, Decimal::ZERO);
    assert_eq!(tb.rows[1].debit, dec!(300));
}

#[test]
fn test_statement_running_balance() {
    let cash = account("1000", AccountType::Asset);
    let revenue = account("4000", AccountType::Revenue);
    let expense = account("5000", AccountType::Expense);

    let opening = posting(day(1), &cash, &revenue, dec!(100));
    let mut in_range = posting(day(5), &cash, &revenue, dec!(50));
    in_range.extend(posting(day(6), &expense, &cash, dec!(30)));

    let statement = ReportService::statement(&cash, &opening, &in_range, day(2), day(10)).unwrap();
    assert_eq!(statement.opening_balance, dec!(100));
    assert_eq!(statement.lines.len(), 2);
    assert_eq!(statement.lines[0].running_balance, dec!(150));
    assert_eq!(statement.lines[1].running_balance, dec!(120));
    assert_eq!(statement.lines[1].signed_amount, dec!(-30));
    assert_eq!(statement.debit_total, dec!(50));
    assert_eq!(statement.credit_total, dec!(30));
    assert_eq!(statement.closing_balance, dec!(120));
}

#[test]
fn test_rollup_over_children() {
    let parent = account("1000", AccountType::Asset);
    let mut petty = account("1010", AccountType::Asset);
    petty.parent_id = Some(parent.id);
    let mut bank = account("1020", AccountType::Asset);
    bank.parent_id = Some(parent.id);
    let capital = account("3000", AccountType::Equity);
    let accounts = vec![parent.clone(), petty.clone(), bank.clone(), capital.clone()];

    let mut lines = posting(day(1), &petty, &capital, dec!(40));
    lines.extend(posting(day(1), &bank, &capital, dec!(960)));

    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    let tree = AccountTree::build(&accounts);
    let rollup = ReportService::rollup(&tree, &balances, parent.id, day(31))
        .unwrap()
        .unwrap();
    assert_eq!(rollup.own_balance, Decimal::ZERO);
    assert_eq!(rollup.total_balance, dec!(1000));
    assert_eq!(rollup.descendants.len(), 2);
    assert!(
        ReportService::rollup(&tree, &balances, AccountId::new(), day(31))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_overflowing_balance_is_an_error() {
    let cash = account("1000", AccountType::Asset);
    let revenue = account("4000", AccountType::Revenue);
    let accounts = vec![cash.clone(), revenue.clone()];
    let mut lines = posting(day(1), &cash, &revenue, Decimal::MAX);
    lines.extend(posting(day(2), &cash, &revenue, dec!(1)));

    assert_eq!(
        ReportService::balances_by_account(&accounts, &lines),
        Err(LedgerError::AmountOverflow)
    );
    assert_eq!(
        ReportService::account_balance(&cash, &lines),
        Err(LedgerError::AmountOverflow)
    );
    assert_eq!(
        ReportService::statement(&cash, &[], &lines, day(1), day(31)),
        Err(LedgerError::AmountOverflow)
    );
}

#[test]
fn test_report_totals_overflow_is_an_error() {
    let a = account("1000", AccountType::Asset);
    let b = account("1100", AccountType::Asset);
    let capital_a = account("3000", AccountType::Equity);
    let capital_b = account("3100", AccountType::Equity);
    let accounts = vec![a.clone(), b.clone(), capital_a.clone(), capital_b.clone()];
    let mut lines = posting(day(1), &a, &capital_a, Decimal::MAX);
    lines.extend(posting(day(1), &b, &capital_b, Decimal::MAX));

    // Every account balance fits; the column totals do not.
    let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
    assert_eq!(balances[0].balance, Decimal::MAX);
    assert_eq!(
        ReportService::generate_trial_balance(&balances, day(31), "USD"),
        Err(LedgerError::AmountOverflow)
    );
    assert_eq!(
        ReportService::generate_balance_sheet(&balances, day(31), "USD"),
        Err(LedgerError::AmountOverflow)
    );
}

/// Strategy producing postings between a fixed five-account chart.
fn arb_postings() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..5, 0usize..5, 1i64..10_000_000), 0..30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 1: Trial balance debits equal credits**
    ///
    /// *For any* set of balanced postings, the trial balance columns SHALL agree.
    #[test]
    fn prop_trial_balance_identity(postings in arb_postings()) {
        let accounts: Vec<Account> = AccountType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| account(&format!("{}000", i + 1), *t))
            .collect();
        let lines: Vec<LedgerLine> = postings
            .iter()
            .flat_map(|(d, c, cents)| {
                posting(day(1), &accounts[*d], &accounts[*c], Decimal::new(*cents, 2))
            })
            .collect();

        let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
        let tb = ReportService::generate_trial_balance(&balances, day(31), "USD").unwrap();
        prop_assert!(tb.totals.is_balanced);
        prop_assert_eq!(tb.totals.total_debit, tb.totals.total_credit);
    }

    /// **Property 2: Balance sheet identity**
    ///
    /// *For any* set of balanced postings, Assets SHALL equal Liabilities + Equity
    /// once current earnings are included.
    #[test]
    fn prop_balance_sheet_identity(postings in arb_postings()) {
        let accounts: Vec<Account> = AccountType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| account(&format!("{}000", i + 1), *t))
            .collect();
        let lines: Vec<LedgerLine> = postings
            .iter()
            .flat_map(|(d, c, cents)| {
                posting(day(1), &accounts[*d], &accounts[*c], Decimal::new(*cents, 2))
            })
            .collect();

        let balances = ReportService::balances_by_account(&accounts, &lines).unwrap();
        let bs = ReportService::generate_balance_sheet(&balances, day(31), "USD").unwrap();
        prop_assert!(bs.is_balanced);
        prop_assert_eq!(bs.total_assets, bs.liabilities_and_equity);

        let is = ReportService::generate_income_statement(&balances, day(1), day(31), "USD").unwrap();
        prop_assert_eq!(is.net_income, bs.current_earnings);
    }
}

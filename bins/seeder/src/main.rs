//! Database seeder for Tally development and testing.
//!
//! Seeds a small chart of accounts and posts a month of sample entries
//! through the ledger engine, then logs the resulting trial balance.
//! Running it against an already seeded database is a no-op. Engine
//! errors are classified through `AppError`; retryable ones (lock
//! timeouts, serialization conflicts) are retried a few times.
//!
//! Usage: cargo run --bin seeder

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_core::LedgerEngine;
use tally_core::accounts::{AccountType, CreateAccountInput};
use tally_core::ledger::{CreateEntryInput, JournalLineInput};
use tally_db::PgLedgerStore;
use tally_shared::types::{AccountId, ActorId, JournalEntryId};
use tally_shared::{AppConfig, AppError};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Engine = LedgerEngine<PgLedgerStore>;

const MAX_POST_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// (code, name, type, parent code)
const CHART: &[(&str, &str, AccountType, Option<&str>)] = &[
    ("1000", "Assets", AccountType::Asset, None),
    ("1010", "Cash on hand", AccountType::Asset, Some("1000")),
    ("1020", "Operating bank account", AccountType::Asset, Some("1000")),
    ("1200", "Accounts receivable", AccountType::Asset, Some("1000")),
    ("2000", "Liabilities", AccountType::Liability, None),
    ("2100", "Accounts payable", AccountType::Liability, Some("2000")),
    ("3000", "Equity", AccountType::Equity, None),
    ("3100", "Owner capital", AccountType::Equity, Some("3000")),
    ("4000", "Revenue", AccountType::Revenue, None),
    ("4100", "Consulting revenue", AccountType::Revenue, Some("4000")),
    ("5000", "Expenses", AccountType::Expense, None),
    ("5100", "Office rent", AccountType::Expense, Some("5000")),
    ("5200", "Software subscriptions", AccountType::Expense, Some("5000")),
];

/// (day of month, reference, description, debit code, credit code, amount)
const SAMPLE_ENTRIES: &[(u32, &str, &str, &str, &str, Decimal)] = &[
    (1, "CAP-001", "Initial owner contribution", "1020", "3100", dec!(50000)),
    (3, "RENT-2026-01", "January office rent", "5100", "1020", dec!(2500)),
    (8, "INV-1001", "Consulting engagement, phase 1", "1200", "4100", dec!(12000)),
    (15, "BILL-311", "Design tool subscription", "5200", "2100", dec!(480)),
    (20, "RCPT-1001", "Payment received for INV-1001", "1020", "1200", dec!(8000)),
    (22, "PETTY-01", "Petty cash float", "1010", "1020", dec!(300)),
    (28, "PAY-311", "Settle BILL-311", "2100", "1020", dec!(480)),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = tally_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let engine = LedgerEngine::new(Arc::new(PgLedgerStore::new(db)), config.ledger);
    let actor = ActorId::new();

    if !engine.list_accounts().await?.is_empty() {
        info!("Chart of accounts already present, skipping seed");
        return Ok(());
    }

    info!("Seeding chart of accounts...");
    let accounts = seed_chart(&engine, actor).await?;

    info!("Posting sample entries...");
    seed_entries(&engine, &accounts, actor).await?;

    let as_of = january(31)?;
    let trial_balance = engine.trial_balance(as_of).await?;
    info!(
        rows = trial_balance.rows.len(),
        debit = %trial_balance.totals.total_debit,
        credit = %trial_balance.totals.total_credit,
        "Trial balance as of {as_of}"
    );
    let balance_sheet = engine.balance_sheet(as_of).await?;
    info!(
        assets = %balance_sheet.total_assets,
        liabilities_and_equity = %balance_sheet.liabilities_and_equity,
        current_earnings = %balance_sheet.current_earnings,
        "Balance sheet as of {as_of}"
    );

    info!("Seeding complete!");
    Ok(())
}

fn january(day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 1, day).with_context(|| format!("invalid day {day}"))
}

/// Creates the chart in order; parents precede their children.
async fn seed_chart(engine: &Engine, actor: ActorId) -> Result<HashMap<&'static str, AccountId>> {
    let mut ids = HashMap::new();
    for &(code, name, account_type, parent) in CHART {
        let mut input = CreateAccountInput::new(code, name, account_type, "USD");
        if let Some(parent_code) = parent {
            let parent_id = ids
                .get(parent_code)
                .copied()
                .with_context(|| format!("parent {parent_code} not seeded before {code}"))?;
            input = input.with_parent(parent_id);
        }
        let account = engine
            .create_account(input, actor)
            .await
            .with_context(|| format!("Failed to create account {code}"))?;
        ids.insert(code, account.id);
    }
    Ok(ids)
}

async fn seed_entries(
    engine: &Engine,
    accounts: &HashMap<&'static str, AccountId>,
    actor: ActorId,
) -> Result<()> {
    let account = |code: &str| {
        accounts
            .get(code)
            .copied()
            .with_context(|| format!("unknown account code {code}"))
    };

    for &(day, reference, description, debit, credit, amount) in SAMPLE_ENTRIES {
        let input = CreateEntryInput {
            entry_date: january(day)?,
            reference: reference.to_string(),
            description: description.to_string(),
            lines: vec![
                JournalLineInput::debit(account(debit)?, amount),
                JournalLineInput::credit(account(credit)?, amount),
            ],
        };
        let draft = engine
            .create_entry(input, actor)
            .await
            .map_err(|err| report(AppError::from(err), reference))
            .with_context(|| format!("Failed to draft {reference}"))?;
        post_with_retry(engine, draft.id, actor)
            .await
            .map_err(|err| report(err, reference))
            .with_context(|| format!("Failed to post {reference}"))?;
    }
    Ok(())
}

async fn post_with_retry(
    engine: &Engine,
    id: JournalEntryId,
    actor: ActorId,
) -> Result<(), AppError> {
    let mut attempt = 1;
    loop {
        match engine.post_entry(id, actor).await {
            Ok(_) => return Ok(()),
            Err(err) => {
                let err = AppError::from(err);
                if !should_retry(&err, attempt) {
                    return Err(err);
                }
                warn!(
                    entry_id = %id,
                    attempt,
                    error_code = err.error_code(),
                    "Posting failed, retrying: {err}"
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
        }
    }
}

fn should_retry(err: &AppError, attempt: u32) -> bool {
    err.is_retryable() && attempt < MAX_POST_ATTEMPTS
}

fn report(err: AppError, reference: &str) -> AppError {
    if err.is_internal() {
        error!(reference, error_code = err.error_code(), "Seeding failed: {err}");
    } else {
        warn!(reference, error_code = err.error_code(), "Seed entry rejected: {err}");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::LedgerError;

    #[test]
    fn test_only_concurrency_failures_are_retried() {
        let timeout = AppError::from(LedgerError::PostingTimeout { timeout_ms: 5000 });
        assert!(should_retry(&timeout, 1));
        assert!(should_retry(&AppError::from(LedgerError::ConcurrentModification), 2));
        assert!(!should_retry(&timeout, MAX_POST_ATTEMPTS));

        let posted = AppError::from(LedgerError::AlreadyPosted(JournalEntryId::new()));
        assert!(!should_retry(&posted, 1));
        assert_eq!(posted.error_code(), "STATE_ERROR");
    }
}

//! Property tests driving `LedgerEngine` through random postings and reversals.
//!
//! After every step the trial balance and the balance sheet must balance.
//! Reversing everything that still carries an effect must return every
//! account to zero.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tally_core::accounts::{Account, AccountType, CreateAccountInput};
use tally_core::ledger::{CreateEntryInput, JournalLineInput};
use tally_core::store::InMemoryStore;
use tally_core::LedgerEngine;
use tally_shared::LedgerConfig;
use tally_shared::types::{ActorId, JournalEntryId};

const CHART: [(&str, AccountType); 5] = [
    ("1000", AccountType::Asset),
    ("2000", AccountType::Liability),
    ("3000", AccountType::Equity),
    ("4000", AccountType::Revenue),
    ("5000", AccountType::Expense),
];

#[derive(Debug, Clone)]
enum Step {
    Post {
        debit: usize,
        offset: usize,
        cents: i64,
        day: u32,
    },
    Reverse(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..CHART.len(), 0..CHART.len() - 1, 1i64..10_000_000, 1u32..=28).prop_map(
            |(debit, offset, cents, day)| Step::Post {
                debit,
                offset,
                cents,
                day,
            }
        ),
        1 => any::<usize>().prop_map(Step::Reverse),
    ]
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

async fn assert_balanced(engine: &LedgerEngine<InMemoryStore>) -> Result<(), TestCaseError> {
    let as_of = date(31);
    let tb = engine.trial_balance(as_of).await;
    prop_assert!(tb.is_ok(), "trial balance failed: {tb:?}");
    let tb = tb.unwrap();
    prop_assert!(tb.totals.is_balanced);
    prop_assert_eq!(tb.totals.total_debit, tb.totals.total_credit);

    let bs = engine.balance_sheet(as_of).await;
    prop_assert!(bs.is_ok(), "balance sheet failed: {bs:?}");
    prop_assert!(bs.unwrap().is_balanced);
    Ok(())
}

async fn run(steps: Vec<Step>) -> Result<(), TestCaseError> {
    let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()), LedgerConfig::default());
    let actor = ActorId::new();
    let mut accounts: Vec<Account> = Vec::with_capacity(CHART.len());
    for (code, account_type) in CHART {
        let input = CreateAccountInput::new(code, format!("Account {code}"), account_type, "USD");
        accounts.push(engine.create_account(input, actor).await.unwrap());
    }

    // Posted entries not yet reversed, with the sign of their effect
    // relative to the entry that started their reversal chain.
    let mut live: Vec<JournalEntryId> = Vec::new();
    let mut sign: HashMap<JournalEntryId, i8> = HashMap::new();

    for step in steps {
        match step {
            Step::Post {
                debit,
                offset,
                cents,
                day,
            } => {
                let credit = (debit + 1 + offset) % accounts.len();
                let amount = Decimal::new(cents, 2);
                let input = CreateEntryInput {
                    entry_date: date(day),
                    reference: format!("P-{}", live.len()),
                    description: "generated posting".into(),
                    lines: vec![
                        JournalLineInput::debit(accounts[debit].id, amount),
                        JournalLineInput::credit(accounts[credit].id, amount),
                    ],
                };
                let draft = engine.create_entry(input, actor).await.unwrap();
                engine.post_entry(draft.id, actor).await.unwrap();
                live.push(draft.id);
                sign.insert(draft.id, 1);
            }
            Step::Reverse(pick) => {
                if live.is_empty() {
                    continue;
                }
                let id = live.remove(pick % live.len());
                let result = engine.reverse_entry(id, "generated reversal", actor).await.unwrap();
                live.push(result.reversal.id);
                sign.insert(result.reversal.id, -sign[&id]);
            }
        }
        assert_balanced(&engine).await?;
    }

    for id in live.iter().filter(|id| sign[*id] == 1) {
        engine.reverse_entry(*id, "closing out", actor).await.unwrap();
    }
    assert_balanced(&engine).await?;
    for account in &accounts {
        let balance = engine.balance(account.id, date(31)).await.unwrap();
        prop_assert_eq!(balance.balance, Decimal::ZERO, "account {}", account.code);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Random postings and reversals never unbalance the books, and undoing
    /// every live effect zeroes them.
    #[test]
    fn prop_postings_and_reversals_keep_books_balanced(
        steps in prop::collection::vec(step(), 1..30)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(run(steps))?;
    }
}

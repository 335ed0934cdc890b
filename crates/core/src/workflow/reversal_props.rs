//! Property-based tests for ReversalService.
//!
//! Property 4: Reversal Exact Mirror

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tally_shared::types::{AccountId, ActorId};

use crate::ledger::{EntryStatus, JournalEntry, JournalLine, Side};
use crate::workflow::reversal::ReversalService;

/// Strategy for generating random account IDs.
fn arb_account() -> impl Strategy<Value = AccountId> {
    any::<u128>().prop_map(|n| AccountId::from_uuid(uuid::Uuid::from_u128(n)))
}

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for balanced line sets: several debits against one credit.
fn arb_balanced_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    (
        prop::collection::vec((arb_account(), arb_amount()), 1..5),
        arb_account(),
    )
        .prop_map(|(debits, credit_account)| {
            let total: Decimal = debits.iter().map(|(_, amount)| *amount).sum();
            let mut lines: Vec<JournalLine> = debits
                .into_iter()
                .map(|(account_id, amount)| JournalLine {
                    line_no: 0,
                    account_id,
                    side: Side::Debit,
                    amount,
                    description: None,
                })
                .collect();
            lines.push(JournalLine {
                line_no: 0,
                account_id: credit_account,
                side: Side::Credit,
                amount: total,
                description: None,
            });
            for (line, no) in lines.iter_mut().zip(1u32..) {
                line.line_no = no;
            }
            lines
        })
}

fn posted(lines: Vec<JournalLine>) -> JournalEntry {
    let mut entry = JournalEntry::draft(
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap_or_default(),
        "JV-P".into(),
        "generated".into(),
        lines,
        ActorId::new(),
        Utc::now(),
    );
    entry.status = EntryStatus::Posted;
    entry
}

/// Net debit-positive effect per account.
fn net_effect(lines: &[JournalLine]) -> HashMap<AccountId, Decimal> {
    let mut net = HashMap::new();
    for line in lines {
        *net.entry(line.account_id).or_insert(Decimal::ZERO) += line.debit() - line.credit();
    }
    net
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property 4.1: Original plus reversal nets to zero on every account**
    #[test]
    fn prop_reversal_nets_to_zero(lines in arb_balanced_lines()) {
        let original = posted(lines);
        let reversal = ReversalService::create_reversal(&original, "test", ActorId::new(), Utc::now());

        let mut combined = original.lines.clone();
        combined.extend(reversal.lines.iter().cloned());
        for (_, net) in net_effect(&combined) {
            prop_assert_eq!(net, Decimal::ZERO);
        }
    }

    /// **Property 4.2: Reversal preserves line count, accounts and amounts**
    #[test]
    fn prop_reversal_preserves_shape(lines in arb_balanced_lines()) {
        let original = posted(lines);
        let reversal = ReversalService::create_reversal(&original, "test", ActorId::new(), Utc::now());

        prop_assert_eq!(reversal.lines.len(), original.lines.len());
        for (o, r) in original.lines.iter().zip(&reversal.lines) {
            prop_assert_eq!(o.account_id, r.account_id);
            prop_assert_eq!(o.amount, r.amount);
            prop_assert_eq!(o.line_no, r.line_no);
            prop_assert_eq!(o.side.opposite(), r.side);
        }
    }

    /// **Property 4.3: Reversal of a balanced entry is balanced**
    #[test]
    fn prop_reversal_is_balanced(lines in arb_balanced_lines()) {
        let original = posted(lines);
        let reversal = ReversalService::create_reversal(&original, "test", ActorId::new(), Utc::now());
        prop_assert!(ReversalService::validate_reversal(&reversal.lines));
        prop_assert_eq!(reversal.totals().unwrap().debit, original.totals().unwrap().credit);
    }

    /// **Property 4.4: Reversing twice restores the original sides**
    #[test]
    fn prop_double_mirror_is_identity(lines in arb_balanced_lines()) {
        let twice = ReversalService::mirror_lines(&ReversalService::mirror_lines(&lines));
        for (o, t) in lines.iter().zip(&twice) {
            prop_assert_eq!(o.side, t.side);
            prop_assert_eq!(o.amount, t.amount);
        }
    }
}

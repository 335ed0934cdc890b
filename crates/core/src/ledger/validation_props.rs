//! Property-based tests for journal entry validation rules.
//!
//! Property 1: Entry Validation Rules
//! Property 2: Balance Invariant

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tally_shared::types::AccountId;

use super::error::{LedgerError, LineDefect};
use super::service::{AccountInfo, LedgerService};
use super::types::JournalLineInput;

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // Generate amounts from 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// A small chart of active USD accounts and its lookup table.
fn chart(n: usize) -> (Vec<AccountId>, HashMap<AccountId, AccountInfo>) {
    let ids: Vec<AccountId> = (0..n).map(|_| AccountId::new()).collect();
    let table = ids
        .iter()
        .map(|id| {
            (
                *id,
                AccountInfo {
                    id: *id,
                    is_active: true,
                    currency: "USD".to_string(),
                },
            )
        })
        .collect();
    (ids, table)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Property 1: Entry Validation Rules
    // =========================================================================

    /// Property 1.1: Negative amounts are rejected.
    #[test]
    fn prop_negative_amount_rejected(
        neg in negative_amount(),
        other in positive_amount(),
    ) {
        let (ids, table) = chart(2);
        let lines = vec![
            JournalLineInput::debit(ids[0], neg),
            JournalLineInput::credit(ids[1], other),
        ];
        let result = LedgerService::validate_lines(&lines, |id| table.get(&id).cloned());
        prop_assert_eq!(
            result,
            Err(LedgerError::InvalidLine { line_no: 1, defect: LineDefect::Negative })
        );
    }

    /// Property 1.2: Lines with both sides set are rejected.
    #[test]
    fn prop_both_sides_rejected(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        let (ids, table) = chart(2);
        let lines = vec![
            JournalLineInput::debit(ids[0], debit),
            JournalLineInput {
                account_id: ids[1],
                debit,
                credit,
                description: None,
            },
        ];
        let result = LedgerService::validate_lines(&lines, |id| table.get(&id).cloned());
        prop_assert_eq!(
            result,
            Err(LedgerError::InvalidLine { line_no: 2, defect: LineDefect::BothSides })
        );
    }

    /// Property 1.3: Single line entries are rejected.
    #[test]
    fn prop_single_line_rejected(amount in positive_amount()) {
        let (ids, table) = chart(1);
        let lines = vec![JournalLineInput::debit(ids[0], amount)];
        let result = LedgerService::validate_lines(&lines, |id| table.get(&id).cloned());
        prop_assert_eq!(result, Err(LedgerError::InsufficientLines));
    }

    // =========================================================================
    // Property 2: Balance Invariant
    // =========================================================================

    /// Property 2.1: Entries whose debit parts sum to the credit total are accepted.
    #[test]
    fn prop_split_balanced_entry_accepted(
        parts in prop::collection::vec(positive_amount(), 1..8),
    ) {
        let (ids, table) = chart(2);
        let total: Decimal = parts.iter().copied().sum();
        let mut lines: Vec<JournalLineInput> = parts
            .iter()
            .map(|p| JournalLineInput::debit(ids[0], *p))
            .collect();
        lines.push(JournalLineInput::credit(ids[1], total));

        let (validated, totals) =
            LedgerService::validate_lines(&lines, |id| table.get(&id).cloned()).unwrap();
        prop_assert_eq!(validated.len(), parts.len() + 1);
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.debit, total);
    }

    /// Property 2.2: Any non-zero imbalance is rejected with both totals reported.
    #[test]
    fn prop_imbalance_rejected(
        debit in positive_amount(),
        credit in positive_amount(),
    ) {
        prop_assume!(debit != credit);
        let (ids, table) = chart(2);
        let lines = vec![
            JournalLineInput::debit(ids[0], debit),
            JournalLineInput::credit(ids[1], credit),
        ];
        let result = LedgerService::validate_lines(&lines, |id| table.get(&id).cloned());
        prop_assert_eq!(result, Err(LedgerError::UnbalancedEntry { debit, credit }));
    }
}

//! Deterministic statement matching.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{ExternalLine, MatchOutcome, MatchedPair, UnmatchedExternal};
use crate::ledger::{LedgerError, LedgerLine, checked_sum};

/// Default maximum date distance between matched lines.
pub const DEFAULT_TOLERANCE_DAYS: u32 = 3;

/// Matches external statement lines to ledger lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    tolerance_days: u32,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_DAYS)
    }
}

impl Matcher {
    /// Creates a matcher accepting date differences up to `tolerance_days`.
    #[must_use]
    pub const fn new(tolerance_days: u32) -> Self {
        Self { tolerance_days }
    }

    /// Runs one matching pass.
    ///
    /// External lines are visited in (date, input index) order. Each takes
    /// the unmatched ledger line with the same signed amount and a date
    /// within tolerance, preferring the smallest date distance, then the
    /// earliest accounting date, then ledger order. `ledger` must already be
    /// in ledger order.
    #[must_use]
    pub fn run(&self, external: &[ExternalLine], ledger: &[LedgerLine]) -> MatchOutcome {
        let mut order: Vec<usize> = (0..external.len()).collect();
        order.sort_by_key(|&i| (external[i].date, i));

        let mut taken = vec![false; ledger.len()];
        let mut matched = Vec::new();
        let mut unmatched_external = Vec::new();

        for index in order {
            let ext = &external[index];
            let best = ledger
                .iter()
                .enumerate()
                .filter(|(pos, line)| !taken[*pos] && line.signed_amount() == ext.amount)
                .filter_map(|(pos, line)| {
                    let distance = (line.entry_date - ext.date).num_days().unsigned_abs();
                    (distance <= u64::from(self.tolerance_days))
                        .then_some((distance, line.entry_date, pos))
                })
                .min();

            match best {
                Some((_, _, pos)) => {
                    taken[pos] = true;
                    let line = &ledger[pos];
                    matched.push(MatchedPair {
                        external_index: index,
                        ledger_line_id: line.id,
                        amount: ext.amount,
                        external_date: ext.date,
                        ledger_date: line.entry_date,
                    });
                }
                None => unmatched_external.push(UnmatchedExternal {
                    index,
                    line: ext.clone(),
                }),
            }
        }

        matched.sort_by_key(|pair| pair.external_index);
        unmatched_external.sort_by_key(|u| u.index);
        let unmatched_ledger = ledger
            .iter()
            .zip(&taken)
            .filter(|(_, taken)| !**taken)
            .map(|(line, _)| line.id)
            .collect();

        MatchOutcome {
            matched,
            unmatched_external,
            unmatched_ledger,
        }
    }

    /// Statement balance: the supplied figure, or the sum of external lines.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if the external lines cannot be summed.
    pub fn external_balance(
        external: &[ExternalLine],
        statement_balance: Option<Decimal>,
    ) -> Result<Decimal, LedgerError> {
        match statement_balance {
            Some(balance) => Ok(balance),
            None => checked_sum(external.iter().map(|l| l.amount)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Side;
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use tally_shared::types::{AccountId, JournalEntryId, LedgerLineId};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn ledger_line(date: NaiveDate, side: Side, amount: Decimal) -> LedgerLine {
        LedgerLine {
            id: LedgerLineId::new(),
            entry_id: JournalEntryId::new(),
            line_no: 1,
            account_id: AccountId::new(),
            side,
            amount,
            normal_side: Side::Debit,
            entry_date: date,
            posted_at: Utc::now(),
            description: None,
        }
    }

    #[test]
    fn test_exact_match() {
        let ledger = vec![ledger_line(day(5), Side::Debit, dec!(100))];
        let external = vec![ExternalLine::new(day(5), dec!(100))];
        let outcome = Matcher::default().run(&external, &ledger);
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].ledger_line_id, ledger[0].id);
        assert!(outcome.unmatched_external.is_empty());
        assert!(outcome.unmatched_ledger.is_empty());
    }

    #[test]
    fn test_sign_must_agree() {
        let ledger = vec![ledger_line(day(5), Side::Credit, dec!(100))];
        let external = vec![ExternalLine::new(day(5), dec!(100))];
        let outcome = Matcher::default().run(&external, &ledger);
        assert!(outcome.matched.is_empty());
        assert_eq!(outcome.unmatched_external[0].index, 0);
        assert_eq!(outcome.unmatched_ledger, vec![ledger[0].id]);

        let external = vec![ExternalLine::new(day(5), dec!(-100))];
        assert_eq!(Matcher::default().run(&external, &ledger).matched.len(), 1);
    }

    #[test]
    fn test_tolerance_window() {
        let ledger = vec![ledger_line(day(10), Side::Debit, dec!(50))];
        let within = vec![ExternalLine::new(day(13), dec!(50))];
        let outside = vec![ExternalLine::new(day(14), dec!(50))];
        assert_eq!(Matcher::new(3).run(&within, &ledger).matched.len(), 1);
        assert!(Matcher::new(3).run(&outside, &ledger).matched.is_empty());
        assert!(Matcher::new(0).run(&within, &ledger).matched.is_empty());
    }

    #[test]
    fn test_prefers_closest_date() {
        let far = ledger_line(day(8), Side::Debit, dec!(20));
        let near = ledger_line(day(11), Side::Debit, dec!(20));
        let ledger = vec![far.clone(), near.clone()];
        let external = vec![ExternalLine::new(day(10), dec!(20))];
        let outcome = Matcher::default().run(&external, &ledger);
        assert_eq!(outcome.matched[0].ledger_line_id, near.id);
        assert_eq!(outcome.unmatched_ledger, vec![far.id]);
    }

    #[test]
    fn test_tie_prefers_earlier_accounting_date() {
        let before = ledger_line(day(9), Side::Debit, dec!(20));
        let after = ledger_line(day(11), Side::Debit, dec!(20));
        let ledger = vec![after.clone(), before.clone()];
        let external = vec![ExternalLine::new(day(10), dec!(20))];
        let outcome = Matcher::default().run(&external, &ledger);
        assert_eq!(outcome.matched[0].ledger_line_id, before.id);
    }

    #[test]
    fn test_each_ledger_line_matches_once() {
        let ledger = vec![ledger_line(day(5), Side::Debit, dec!(30))];
        let external = vec![
            ExternalLine::new(day(6), dec!(30)),
            ExternalLine::new(day(5), dec!(30)),
        ];
        let outcome = Matcher::default().run(&external, &ledger);
        // The earlier-dated external line (index 1) is processed first.
        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.matched[0].external_index, 1);
        assert_eq!(outcome.unmatched_external[0].index, 0);
    }

    #[test]
    fn test_external_balance_defaults_to_sum() {
        let external = vec![
            ExternalLine::new(day(1), dec!(100)),
            ExternalLine::new(day(2), dec!(-40)),
        ];
        assert_eq!(Matcher::external_balance(&external, None), Ok(dec!(60)));
        assert_eq!(Matcher::external_balance(&external, Some(dec!(75))), Ok(dec!(75)));
        assert_eq!(Matcher::external_balance(&[], None), Ok(Decimal::ZERO));

        let huge = vec![
            ExternalLine::new(day(1), Decimal::MAX),
            ExternalLine::new(day(2), Decimal::MAX),
        ];
        assert_eq!(
            Matcher::external_balance(&huge, None),
            Err(LedgerError::AmountOverflow)
        );
    }

    #[test]
    fn test_matching_is_deterministic() {
        let base = day(1);
        let ledger: Vec<LedgerLine> = (0..6)
            .map(|i| ledger_line(base + Duration::days(i), Side::Debit, dec!(10)))
            .collect();
        let external: Vec<ExternalLine> = (0..4)
            .map(|i| ExternalLine::new(base + Duration::days(i * 2), dec!(10)))
            .collect();
        let first = Matcher::default().run(&external, &ledger);
        let second = Matcher::default().run(&external, &ledger);
        assert_eq!(first, second);
        assert_eq!(first.matched.len(), 4);
        assert_eq!(first.unmatched_ledger.len(), 2);
    }
}

//! Reversal service for posted journal entries.
//!
//! A reversal is a sibling entry whose lines mirror the original with
//! debit and credit swapped. The original is never edited beyond its
//! reversal link.

use chrono::{DateTime, Utc};
use tally_shared::types::{ActorId, JournalEntryId};

use crate::ledger::{EntryStatus, JournalEntry, JournalLine, LedgerService};

/// Prefix applied to the reversal entry's reference.
pub const REVERSAL_REFERENCE_PREFIX: &str = "REV-";

/// Stateless service for creating reversal entries.
pub struct ReversalService;

impl ReversalService {
    /// Create mirrored lines by swapping debits and credits.
    ///
    /// For each original line:
    /// - Debits become credits
    /// - Credits become debits
    /// - Account, amount, line number are preserved
    /// - Description is prefixed with "Reversal: "
    #[must_use]
    pub fn mirror_lines(lines: &[JournalLine]) -> Vec<JournalLine> {
        lines
            .iter()
            .map(|line| JournalLine {
                line_no: line.line_no,
                account_id: line.account_id,
                side: line.side.opposite(),
                amount: line.amount,
                description: Some(format!(
                    "Reversal: {}",
                    line.description.clone().unwrap_or_default()
                )),
            })
            .collect()
    }

    /// Build the posted reversal entry for `original`.
    ///
    /// The reversal keeps the original's accounting date and is referenced
    /// `REV-<original reference>`.
    #[must_use]
    pub fn create_reversal(
        original: &JournalEntry,
        reason: &str,
        actor: ActorId,
        now: DateTime<Utc>,
    ) -> JournalEntry {
        JournalEntry {
            id: JournalEntryId::new(),
            entry_date: original.entry_date,
            reference: format!("{REVERSAL_REFERENCE_PREFIX}{}", original.reference),
            description: format!(
                "Reversal of {}. Reason: {}",
                original.reference,
                reason.trim()
            ),
            status: EntryStatus::Posted,
            lines: Self::mirror_lines(&original.lines),
            created_by: actor,
            created_at: now,
            updated_at: now,
            posted_at: Some(now),
            posted_by: Some(actor),
            reversal_of: Some(original.id),
            reversed_by: None,
            reversal_reason: None,
            reversed_at: None,
            reversed_by_actor: None,
        }
    }

    /// Validate that original lines are balanced.
    ///
    /// Always true for posted entries; a false result (including totals
    /// that overflow) means the stored entry is corrupt.
    #[must_use]
    pub fn validate_reversal(original_lines: &[JournalLine]) -> bool {
        LedgerService::calculate_totals(original_lines).is_ok_and(|totals| totals.is_balanced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Side;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn posted_entry() -> JournalEntry {
        let lines = vec![
            JournalLine {
                line_no: 1,
                account_id: AccountId::new(),
                side: Side::Debit,
                amount: dec!(100.00),
                description: Some("Office supplies".to_string()),
            },
            JournalLine {
                line_no: 2,
                account_id: AccountId::new(),
                side: Side::Credit,
                amount: dec!(100.00),
                description: None,
            },
        ];
        let mut entry = JournalEntry::draft(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            "JV-0001".into(),
            "supplies".into(),
            lines,
            ActorId::new(),
            Utc::now(),
        );
        entry.status = EntryStatus::Posted;
        entry
    }

    #[test]
    fn test_mirror_swaps_sides() {
        let original = posted_entry();
        let mirrored = ReversalService::mirror_lines(&original.lines);
        assert_eq!(mirrored[0].side, Side::Credit);
        assert_eq!(mirrored[1].side, Side::Debit);
        assert_eq!(mirrored[0].amount, dec!(100.00));
        assert_eq!(mirrored[0].account_id, original.lines[0].account_id);
        assert_eq!(
            mirrored[0].description.as_deref(),
            Some("Reversal: Office supplies")
        );
    }

    #[test]
    fn test_create_reversal_header() {
        let original = posted_entry();
        let actor = ActorId::new();
        let reversal = ReversalService::create_reversal(&original, " duplicate ", actor, Utc::now());

        assert_ne!(reversal.id, original.id);
        assert_eq!(reversal.reference, "REV-JV-0001");
        assert_eq!(reversal.entry_date, original.entry_date);
        assert_eq!(reversal.status, EntryStatus::Posted);
        assert_eq!(reversal.reversal_of, Some(original.id));
        assert_eq!(reversal.posted_by, Some(actor));
        assert_eq!(reversal.description, "Reversal of JV-0001. Reason: duplicate");
    }

    #[test]
    fn test_validate_reversal() {
        let original = posted_entry();
        assert!(ReversalService::validate_reversal(&original.lines));
        assert!(!ReversalService::validate_reversal(&original.lines[..1]));

        let mut huge = original.lines.clone();
        huge.extend(original.lines.iter().cloned());
        for line in &mut huge {
            line.amount = rust_decimal::Decimal::MAX;
        }
        assert!(!ReversalService::validate_reversal(&huge));
    }
}

//! Workflow service for journal entry state transitions.
//!
//! Draft --post--> Posted --reverse--> Reversed (terminal)

use chrono::{DateTime, Utc};
use tally_shared::types::{ActorId, JournalEntryId};

use crate::ledger::{EntryStatus, JournalEntry, LedgerError};

/// Stateless service for journal entry lifecycle transitions.
///
/// Guards take the current entry and return the error the transition
/// would produce; transitions return the updated entry without touching
/// storage.
pub struct WorkflowService;

impl WorkflowService {
    /// Check that an entry may be edited or deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotDraft` unless the entry is a draft.
    pub fn ensure_draft(entry: &JournalEntry) -> Result<(), LedgerError> {
        match entry.status {
            EntryStatus::Draft => Ok(()),
            status => Err(LedgerError::NotDraft {
                id: entry.id,
                status,
            }),
        }
    }

    /// Check that an entry may be posted.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPosted` if the entry is Posted or Reversed.
    pub fn ensure_postable(entry: &JournalEntry) -> Result<(), LedgerError> {
        match entry.status {
            EntryStatus::Draft => Ok(()),
            EntryStatus::Posted | EntryStatus::Reversed => {
                Err(LedgerError::AlreadyPosted(entry.id))
            }
        }
    }

    /// Check that an entry may be reversed with the given reason.
    ///
    /// # Errors
    ///
    /// - `ReversalReasonRequired` if the reason is blank
    /// - `NotPosted` if the entry is a draft
    /// - `AlreadyReversed` if the entry is already reversed
    pub fn ensure_reversible(entry: &JournalEntry, reason: &str) -> Result<(), LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::ReversalReasonRequired);
        }
        match entry.status {
            EntryStatus::Posted => Ok(()),
            EntryStatus::Draft => Err(LedgerError::NotPosted(entry.id)),
            EntryStatus::Reversed => Err(LedgerError::AlreadyReversed(entry.id)),
        }
    }

    /// Returns the entry as it reads once posted.
    #[must_use]
    pub fn posted(entry: &JournalEntry, posted_by: ActorId, posted_at: DateTime<Utc>) -> JournalEntry {
        JournalEntry {
            status: EntryStatus::Posted,
            posted_at: Some(posted_at),
            posted_by: Some(posted_by),
            updated_at: posted_at,
            ..entry.clone()
        }
    }

    /// Returns the original entry as it reads once reversed.
    #[must_use]
    pub fn reversed(
        entry: &JournalEntry,
        reversal_id: JournalEntryId,
        reason: &str,
        reversed_by: ActorId,
        reversed_at: DateTime<Utc>,
    ) -> JournalEntry {
        JournalEntry {
            status: EntryStatus::Reversed,
            reversed_by: Some(reversal_id),
            reversal_reason: Some(reason.trim().to_string()),
            reversed_at: Some(reversed_at),
            reversed_by_actor: Some(reversed_by),
            updated_at: reversed_at,
            ..entry.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{JournalLine, Side};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tally_shared::types::AccountId;

    fn entry(status: EntryStatus) -> JournalEntry {
        let lines = vec![
            JournalLine {
                line_no: 1,
                account_id: AccountId::new(),
                side: Side::Debit,
                amount: dec!(10),
                description: None,
            },
            JournalLine {
                line_no: 2,
                account_id: AccountId::new(),
                side: Side::Credit,
                amount: dec!(10),
                description: None,
            },
        ];
        let mut entry = JournalEntry::draft(
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            "JV-7".into(),
            "rent".into(),
            lines,
            ActorId::new(),
            Utc::now(),
        );
        entry.status = status;
        entry
    }

    #[test]
    fn test_draft_guard() {
        assert!(WorkflowService::ensure_draft(&entry(EntryStatus::Draft)).is_ok());
        assert!(matches!(
            WorkflowService::ensure_draft(&entry(EntryStatus::Posted)),
            Err(LedgerError::NotDraft {
                status: EntryStatus::Posted,
                ..
            })
        ));
    }

    #[test]
    fn test_post_guard() {
        assert!(WorkflowService::ensure_postable(&entry(EntryStatus::Draft)).is_ok());
        for status in [EntryStatus::Posted, EntryStatus::Reversed] {
            let e = entry(status);
            assert_eq!(
                WorkflowService::ensure_postable(&e),
                Err(LedgerError::AlreadyPosted(e.id))
            );
        }
    }

    #[test]
    fn test_reverse_guard() {
        let posted = entry(EntryStatus::Posted);
        assert!(WorkflowService::ensure_reversible(&posted, "duplicate").is_ok());
        assert_eq!(
            WorkflowService::ensure_reversible(&posted, "   "),
            Err(LedgerError::ReversalReasonRequired)
        );

        let draft = entry(EntryStatus::Draft);
        assert_eq!(
            WorkflowService::ensure_reversible(&draft, "x"),
            Err(LedgerError::NotPosted(draft.id))
        );

        let reversed = entry(EntryStatus::Reversed);
        assert_eq!(
            WorkflowService::ensure_reversible(&reversed, "x"),
            Err(LedgerError::AlreadyReversed(reversed.id))
        );
    }

    #[test]
    fn test_posted_transition_records_audit() {
        let draft = entry(EntryStatus::Draft);
        let actor = ActorId::new();
        let at = Utc::now();
        let posted = WorkflowService::posted(&draft, actor, at);
        assert_eq!(posted.status, EntryStatus::Posted);
        assert_eq!(posted.posted_by, Some(actor));
        assert_eq!(posted.posted_at, Some(at));
        assert_eq!(posted.lines, draft.lines);
    }

    #[test]
    fn test_reversed_transition_links_sibling() {
        let original = entry(EntryStatus::Posted);
        let sibling = JournalEntryId::new();
        let reversed =
            WorkflowService::reversed(&original, sibling, " typo ", ActorId::new(), Utc::now());
        assert_eq!(reversed.status, EntryStatus::Reversed);
        assert_eq!(reversed.reversed_by, Some(sibling));
        assert_eq!(reversed.reversal_reason.as_deref(), Some("typo"));
    }
}

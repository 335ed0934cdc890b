//! Conversions between `SeaORM` models and core domain types.

use chrono::{DateTime, Utc};
use sea_orm::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tally_core::accounts::{Account, AccountType};
use tally_core::ledger::{EntryStatus, JournalEntry, JournalLine, LedgerLine, Side};
use tally_core::reconciliation::Reconciliation;
use tally_shared::types::{
    AccountId, ActorId, JournalEntryId, LedgerLineId, ReconciliationId,
};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::{
    AccountType as DbAccountType, EntrySide as DbEntrySide, EntryStatus as DbEntryStatus,
};
use crate::entities::{accounts, journal_entries, journal_lines, ledger_lines, reconciliations};
use crate::error::MappingError;

// ========== Enums ==========

pub(crate) const fn to_db_account_type(t: AccountType) -> DbAccountType {
    match t {
        AccountType::Asset => DbAccountType::Asset,
        AccountType::Liability => DbAccountType::Liability,
        AccountType::Equity => DbAccountType::Equity,
        AccountType::Revenue => DbAccountType::Revenue,
        AccountType::Expense => DbAccountType::Expense,
    }
}

pub(crate) const fn from_db_account_type(t: DbAccountType) -> AccountType {
    match t {
        DbAccountType::Asset => AccountType::Asset,
        DbAccountType::Liability => AccountType::Liability,
        DbAccountType::Equity => AccountType::Equity,
        DbAccountType::Revenue => AccountType::Revenue,
        DbAccountType::Expense => AccountType::Expense,
    }
}

pub(crate) const fn to_db_status(status: EntryStatus) -> DbEntryStatus {
    match status {
        EntryStatus::Draft => DbEntryStatus::Draft,
        EntryStatus::Posted => DbEntryStatus::Posted,
        EntryStatus::Reversed => DbEntryStatus::Reversed,
    }
}

pub(crate) const fn from_db_status(status: DbEntryStatus) -> EntryStatus {
    match status {
        DbEntryStatus::Draft => EntryStatus::Draft,
        DbEntryStatus::Posted => EntryStatus::Posted,
        DbEntryStatus::Reversed => EntryStatus::Reversed,
    }
}

pub(crate) const fn to_db_side(side: Side) -> DbEntrySide {
    match side {
        Side::Debit => DbEntrySide::Debit,
        Side::Credit => DbEntrySide::Credit,
    }
}

pub(crate) const fn from_db_side(side: DbEntrySide) -> Side {
    match side {
        DbEntrySide::Debit => Side::Debit,
        DbEntrySide::Credit => Side::Credit,
    }
}

// ========== Scalars ==========

fn to_db_line_no(line_no: u32) -> Result<i32, MappingError> {
    i32::try_from(line_no).map_err(|_| MappingError::LineNumber(i64::from(line_no)))
}

fn from_db_line_no(line_no: i32) -> Result<u32, MappingError> {
    u32::try_from(line_no).map_err(|_| MappingError::LineNumber(i64::from(line_no)))
}

fn utc(at: DateTimeWithTimeZone) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn tz(at: DateTime<Utc>) -> DateTimeWithTimeZone {
    at.into()
}

fn to_json<T: Serialize>(column: &'static str, value: &T) -> Result<serde_json::Value, MappingError> {
    serde_json::to_value(value).map_err(|source| MappingError::Json { column, source })
}

fn from_json<T: DeserializeOwned>(
    column: &'static str,
    value: serde_json::Value,
) -> Result<T, MappingError> {
    serde_json::from_value(value).map_err(|source| MappingError::Json { column, source })
}

// ========== Accounts ==========

pub(crate) fn account_to_active(account: &Account) -> accounts::ActiveModel {
    accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        code: Set(account.code.clone()),
        name: Set(account.name.clone()),
        description: Set(account.description.clone()),
        account_type: Set(to_db_account_type(account.account_type)),
        parent_id: Set(account.parent_id.map(AccountId::into_inner)),
        currency: Set(account.currency.clone()),
        is_active: Set(account.is_active),
        created_by: Set(account.created_by.into_inner()),
        created_at: Set(tz(account.created_at)),
        updated_at: Set(tz(account.updated_at)),
    }
}

pub(crate) fn account_to_domain(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        description: model.description,
        account_type: from_db_account_type(model.account_type),
        parent_id: model.parent_id.map(AccountId::from_uuid),
        currency: model.currency,
        is_active: model.is_active,
        created_by: ActorId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    }
}

// ========== Journal entries ==========

pub(crate) fn entry_to_active(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        entry_date: Set(entry.entry_date),
        reference: Set(entry.reference.clone()),
        description: Set(entry.description.clone()),
        status: Set(to_db_status(entry.status)),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(tz(entry.created_at)),
        updated_at: Set(tz(entry.updated_at)),
        posted_at: Set(entry.posted_at.map(tz)),
        posted_by: Set(entry.posted_by.map(ActorId::into_inner)),
        reversal_of: Set(entry.reversal_of.map(JournalEntryId::into_inner)),
        reversed_by: Set(entry.reversed_by.map(JournalEntryId::into_inner)),
        reversal_reason: Set(entry.reversal_reason.clone()),
        reversed_at: Set(entry.reversed_at.map(tz)),
        reversed_by_actor: Set(entry.reversed_by_actor.map(ActorId::into_inner)),
    }
}

pub(crate) fn journal_lines_to_active(
    entry: &JournalEntry,
) -> Result<Vec<journal_lines::ActiveModel>, MappingError> {
    entry
        .lines
        .iter()
        .map(|line| {
            Ok(journal_lines::ActiveModel {
                id: Set(Uuid::now_v7()),
                entry_id: Set(entry.id.into_inner()),
                line_no: Set(to_db_line_no(line.line_no)?),
                account_id: Set(line.account_id.into_inner()),
                side: Set(to_db_side(line.side)),
                amount: Set(line.amount),
                description: Set(line.description.clone()),
            })
        })
        .collect()
}

fn journal_line_to_domain(model: journal_lines::Model) -> Result<JournalLine, MappingError> {
    Ok(JournalLine {
        line_no: from_db_line_no(model.line_no)?,
        account_id: AccountId::from_uuid(model.account_id),
        side: from_db_side(model.side),
        amount: model.amount,
        description: model.description,
    })
}

/// Assembles an entry from its header row and line rows.
pub(crate) fn entry_to_domain(
    model: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> Result<JournalEntry, MappingError> {
    let mut lines = lines
        .into_iter()
        .map(journal_line_to_domain)
        .collect::<Result<Vec<_>, _>>()?;
    lines.sort_by_key(|l| l.line_no);

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(model.id),
        entry_date: model.entry_date,
        reference: model.reference,
        description: model.description,
        status: from_db_status(model.status),
        lines,
        created_by: ActorId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
        posted_at: model.posted_at.map(utc),
        posted_by: model.posted_by.map(ActorId::from_uuid),
        reversal_of: model.reversal_of.map(JournalEntryId::from_uuid),
        reversed_by: model.reversed_by.map(JournalEntryId::from_uuid),
        reversal_reason: model.reversal_reason,
        reversed_at: model.reversed_at.map(utc),
        reversed_by_actor: model.reversed_by_actor.map(ActorId::from_uuid),
    })
}

// ========== Ledger lines ==========

pub(crate) fn ledger_line_to_active(
    line: &LedgerLine,
) -> Result<ledger_lines::ActiveModel, MappingError> {
    Ok(ledger_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        entry_id: Set(line.entry_id.into_inner()),
        line_no: Set(to_db_line_no(line.line_no)?),
        account_id: Set(line.account_id.into_inner()),
        side: Set(to_db_side(line.side)),
        amount: Set(line.amount),
        normal_side: Set(to_db_side(line.normal_side)),
        entry_date: Set(line.entry_date),
        posted_at: Set(tz(line.posted_at)),
        description: Set(line.description.clone()),
    })
}

pub(crate) fn ledger_line_to_domain(model: ledger_lines::Model) -> Result<LedgerLine, MappingError> {
    Ok(LedgerLine {
        id: LedgerLineId::from_uuid(model.id),
        entry_id: JournalEntryId::from_uuid(model.entry_id),
        line_no: from_db_line_no(model.line_no)?,
        account_id: AccountId::from_uuid(model.account_id),
        side: from_db_side(model.side),
        amount: model.amount,
        normal_side: from_db_side(model.normal_side),
        entry_date: model.entry_date,
        posted_at: utc(model.posted_at),
        description: model.description,
    })
}

// ========== Reconciliations ==========

pub(crate) fn reconciliation_to_active(
    rec: &Reconciliation,
) -> Result<reconciliations::ActiveModel, MappingError> {
    Ok(reconciliations::ActiveModel {
        id: Set(rec.id.into_inner()),
        account_id: Set(rec.account_id.into_inner()),
        statement_date: Set(rec.statement_date),
        external_balance: Set(rec.external_balance),
        ledger_balance: Set(rec.ledger_balance),
        discrepancy: Set(rec.discrepancy),
        matched: Set(to_json("matched", &rec.matched)?),
        unmatched_external: Set(to_json("unmatched_external", &rec.unmatched_external)?),
        unmatched_ledger: Set(to_json("unmatched_ledger", &rec.unmatched_ledger)?),
        created_by: Set(rec.created_by.into_inner()),
        created_at: Set(tz(rec.created_at)),
    })
}

pub(crate) fn reconciliation_to_domain(
    model: reconciliations::Model,
) -> Result<Reconciliation, MappingError> {
    Ok(Reconciliation {
        id: ReconciliationId::from_uuid(model.id),
        account_id: AccountId::from_uuid(model.account_id),
        statement_date: model.statement_date,
        external_balance: model.external_balance,
        ledger_balance: model.ledger_balance,
        discrepancy: model.discrepancy,
        matched: from_json("matched", model.matched)?,
        unmatched_external: from_json("unmatched_external", model.unmatched_external)?,
        unmatched_ledger: from_json("unmatched_ledger", model.unmatched_ledger)?,
        created_by: ActorId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use tally_core::reconciliation::MatchedPair;

    #[rstest]
    #[case(AccountType::Asset)]
    #[case(AccountType::Liability)]
    #[case(AccountType::Equity)]
    #[case(AccountType::Revenue)]
    #[case(AccountType::Expense)]
    fn test_account_type_mapping(#[case] t: AccountType) {
        assert_eq!(from_db_account_type(to_db_account_type(t)), t);
    }

    #[rstest]
    #[case(EntryStatus::Draft, DbEntryStatus::Draft)]
    #[case(EntryStatus::Posted, DbEntryStatus::Posted)]
    #[case(EntryStatus::Reversed, DbEntryStatus::Reversed)]
    fn test_status_mapping(#[case] status: EntryStatus, #[case] db: DbEntryStatus) {
        assert_eq!(to_db_status(status), db);
        assert_eq!(from_db_status(db), status);
    }

    #[test]
    fn test_negative_line_number_rejected() {
        assert!(matches!(
            from_db_line_no(-1),
            Err(MappingError::LineNumber(-1))
        ));
        assert!(to_db_line_no(u32::MAX).is_err());
        assert_eq!(from_db_line_no(3).unwrap(), 3);
    }

    #[test]
    fn test_entry_lines_sorted_by_line_no() {
        let entry_id = Uuid::now_v7();
        let now = tz(Utc::now());
        let header = journal_entries::Model {
            id: entry_id,
            entry_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            reference: "INV-9".into(),
            description: "Sale".into(),
            status: DbEntryStatus::Draft,
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
            posted_at: None,
            posted_by: None,
            reversal_of: None,
            reversed_by: None,
            reversal_reason: None,
            reversed_at: None,
            reversed_by_actor: None,
        };
        let line = |line_no, side| journal_lines::Model {
            id: Uuid::now_v7(),
            entry_id,
            line_no,
            account_id: Uuid::now_v7(),
            side,
            amount: dec!(40),
            description: None,
        };
        let entry = entry_to_domain(
            header,
            vec![line(2, DbEntrySide::Credit), line(1, DbEntrySide::Debit)],
        )
        .unwrap();

        assert_eq!(entry.lines[0].line_no, 1);
        assert_eq!(entry.lines[0].side, Side::Debit);
        assert_eq!(entry.lines[1].side, Side::Credit);
        assert_eq!(entry.status, EntryStatus::Draft);
        assert!(entry.totals().unwrap().is_balanced);
    }

    #[test]
    fn test_reconciliation_json_columns() {
        let now = Utc::now();
        let rec = Reconciliation {
            id: ReconciliationId::new(),
            account_id: AccountId::new(),
            statement_date: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            external_balance: dec!(100),
            ledger_balance: dec!(100),
            discrepancy: dec!(0),
            matched: vec![MatchedPair {
                external_index: 0,
                ledger_line_id: LedgerLineId::new(),
                amount: dec!(100),
                external_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                ledger_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            }],
            unmatched_external: vec![],
            unmatched_ledger: vec![],
            created_by: ActorId::new(),
            created_at: now,
        };
        let active = reconciliation_to_active(&rec).unwrap();
        let matched = active.matched.clone().unwrap();
        assert!(matched.is_array());

        let decoded: Vec<MatchedPair> = from_json("matched", matched).unwrap();
        assert_eq!(decoded, rec.matched);

        let bad = from_json::<Vec<MatchedPair>>("matched", serde_json::json!({"x": 1}));
        assert!(matches!(bad, Err(MappingError::Json { column: "matched", .. })));
    }
}

//! PostgreSQL implementation of the core storage traits.
//!
//! Every commit runs in one database transaction. Postings lock the entry
//! row and the touched account rows with `SELECT ... FOR UPDATE` before
//! checking state, so concurrent writers across processes serialize here
//! as well as on the engine's in-process locks.

mod mapping;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, TransactionTrait,
};
use tally_core::LedgerError;
use tally_core::accounts::Account;
use tally_core::ledger::{EntryStatus, JournalEntry, LedgerLine};
use tally_core::posting::{PostingCommit, ReversalCommit};
use tally_core::reconciliation::Reconciliation;
use tally_core::store::{
    AccountStore, JournalStore, LedgerStore, LineRange, ReconciliationStore, ensure_version,
    sort_ledger_order,
};
use tally_shared::types::{AccountId, JournalEntryId};
use tracing::debug;

use crate::entities::sea_orm_active_enums::EntryStatus as DbEntryStatus;
use crate::entities::{accounts, journal_entries, journal_lines, ledger_lines, reconciliations};
use crate::error::{ACCOUNT_CODE_CONSTRAINT, LEDGER_LINE_CONSTRAINT, storage_error, unique_violation};
use mapping::{
    account_to_active, account_to_domain, entry_to_active, entry_to_domain,
    journal_lines_to_active, ledger_line_to_active, ledger_line_to_domain,
    reconciliation_to_active, reconciliation_to_domain,
};

/// Ledger storage backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
}

impl PgLedgerStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.map_err(storage_error)
    }
}

// ========== Shared queries ==========

async fn load_entry<C>(
    conn: &C,
    id: JournalEntryId,
    lock: bool,
) -> Result<Option<JournalEntry>, LedgerError>
where
    C: ConnectionTrait,
{
    let mut query = journal_entries::Entity::find_by_id(id.into_inner());
    if lock {
        query = query.lock_exclusive();
    }
    let Some(header) = query.one(conn).await.map_err(storage_error)? else {
        return Ok(None);
    };
    let lines = journal_lines::Entity::find()
        .filter(journal_lines::Column::EntryId.eq(header.id))
        .order_by_asc(journal_lines::Column::LineNo)
        .all(conn)
        .await
        .map_err(storage_error)?;
    Ok(Some(entry_to_domain(header, lines)?))
}

/// Locks the entry row and checks it is still the draft version the caller saw.
async fn require_draft(
    txn: &DatabaseTransaction,
    id: JournalEntryId,
    expected_updated_at: DateTime<Utc>,
) -> Result<JournalEntry, LedgerError> {
    let entry = load_entry(txn, id, true)
        .await?
        .ok_or(LedgerError::NotFound(id))?;
    if !entry.status.is_editable() {
        return Err(LedgerError::NotDraft {
            id,
            status: entry.status,
        });
    }
    ensure_version(&entry, expected_updated_at)?;
    Ok(entry)
}

async fn lock_accounts(
    txn: &DatabaseTransaction,
    ids: &[AccountId],
) -> Result<(), LedgerError> {
    let uuids: Vec<_> = ids.iter().map(|id| id.into_inner()).collect();
    accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(uuids))
        .order_by_asc(accounts::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

async fn has_ledger_lines(
    txn: &DatabaseTransaction,
    entry_id: JournalEntryId,
) -> Result<bool, LedgerError> {
    let count = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::EntryId.eq(entry_id.into_inner()))
        .count(txn)
        .await
        .map_err(storage_error)?;
    Ok(count > 0)
}

async fn insert_journal_lines(
    txn: &DatabaseTransaction,
    entry: &JournalEntry,
) -> Result<(), LedgerError> {
    let models = journal_lines_to_active(entry)?;
    if models.is_empty() {
        return Ok(());
    }
    journal_lines::Entity::insert_many(models)
        .exec(txn)
        .await
        .map_err(storage_error)?;
    Ok(())
}

async fn append_ledger_lines(
    txn: &DatabaseTransaction,
    entry_id: JournalEntryId,
    lines: &[LedgerLine],
) -> Result<(), LedgerError> {
    let models = lines
        .iter()
        .map(ledger_line_to_active)
        .collect::<Result<Vec<_>, _>>()?;
    if models.is_empty() {
        return Ok(());
    }
    ledger_lines::Entity::insert_many(models)
        .exec(txn)
        .await
        .map_err(|err| {
            if unique_violation(&err).as_deref() == Some(LEDGER_LINE_CONSTRAINT) {
                LedgerError::EntryAlreadyPosted(entry_id)
            } else {
                storage_error(err)
            }
        })?;
    Ok(())
}

async fn commit(txn: DatabaseTransaction) -> Result<(), LedgerError> {
    txn.commit().await.map_err(storage_error)
}

fn windowed(
    mut query: Select<ledger_lines::Entity>,
    range: LineRange,
) -> Select<ledger_lines::Entity> {
    if let Some(from) = range.from {
        query = query.filter(ledger_lines::Column::EntryDate.gte(from));
    }
    if let Some(to) = range.to {
        query = query.filter(ledger_lines::Column::EntryDate.lte(to));
    }
    query
        .order_by_asc(ledger_lines::Column::EntryDate)
        .order_by_asc(ledger_lines::Column::PostedAt)
        .order_by_asc(ledger_lines::Column::EntryId)
        .order_by_asc(ledger_lines::Column::LineNo)
}

fn into_ledger_lines(models: Vec<ledger_lines::Model>) -> Result<Vec<LedgerLine>, LedgerError> {
    let mut lines = models
        .into_iter()
        .map(ledger_line_to_domain)
        .collect::<Result<Vec<_>, _>>()?;
    sort_ledger_order(&mut lines);
    Ok(lines)
}

// ========== Accounts ==========

#[async_trait]
impl AccountStore for PgLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), LedgerError> {
        account_to_active(account)
            .insert(&self.db)
            .await
            .map_err(|err| {
                if unique_violation(&err).as_deref() == Some(ACCOUNT_CODE_CONSTRAINT) {
                    LedgerError::DuplicateCode(account.code.clone())
                } else {
                    storage_error(err)
                }
            })?;
        debug!(account_id = %account.id, code = %account.code, "Account row inserted");
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(model.map(account_to_domain))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(account_to_domain).collect())
    }

    async fn set_account_active(
        &self,
        id: AccountId,
        is_active: bool,
        at: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage_error)?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let mut active = model.into_active_model();
        active.is_active = Set(is_active);
        active.updated_at = Set(at.into());
        let updated = active.update(&self.db).await.map_err(storage_error)?;

        debug!(account_id = %id, is_active, "Account active flag updated");
        Ok(account_to_domain(updated))
    }
}

// ========== Journal entries ==========

#[async_trait]
impl JournalStore for PgLedgerStore {
    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        entry_to_active(entry)
            .insert(&txn)
            .await
            .map_err(storage_error)?;
        insert_journal_lines(&txn, entry).await?;
        commit(txn).await?;

        debug!(entry_id = %entry.id, lines = entry.lines.len(), "Journal entry inserted");
        Ok(())
    }

    async fn get_entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerError> {
        load_entry(&self.db, id, false).await
    }

    async fn update_draft(
        &self,
        entry: &JournalEntry,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        require_draft(&txn, entry.id, expected_updated_at).await?;

        entry_to_active(entry)
            .update(&txn)
            .await
            .map_err(storage_error)?;
        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(entry.id.into_inner()))
            .exec(&txn)
            .await
            .map_err(storage_error)?;
        insert_journal_lines(&txn, entry).await?;
        commit(txn).await?;

        debug!(entry_id = %entry.id, "Draft entry replaced");
        Ok(())
    }

    async fn delete_draft(
        &self,
        id: JournalEntryId,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        require_draft(&txn, id, expected_updated_at).await?;

        journal_lines::Entity::delete_many()
            .filter(journal_lines::Column::EntryId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(storage_error)?;
        journal_entries::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(storage_error)?;
        commit(txn).await?;

        debug!(entry_id = %id, "Draft entry deleted");
        Ok(())
    }

    async fn count_drafts_for_account(&self, account_id: AccountId) -> Result<u64, LedgerError> {
        let entries_on_account = Query::select()
            .column(journal_lines::Column::EntryId)
            .from(journal_lines::Entity)
            .and_where(journal_lines::Column::AccountId.eq(account_id.into_inner()))
            .to_owned();

        journal_entries::Entity::find()
            .filter(journal_entries::Column::Status.eq(DbEntryStatus::Draft))
            .filter(journal_entries::Column::Id.in_subquery(entries_on_account))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }
}

// ========== Ledger ==========

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn commit_posting(&self, commit_input: &PostingCommit) -> Result<(), LedgerError> {
        let entry = &commit_input.entry;
        let txn = self.begin().await?;

        let stored = load_entry(&txn, entry.id, true)
            .await?
            .ok_or(LedgerError::NotFound(entry.id))?;
        lock_accounts(&txn, &stored.account_ids()).await?;
        if has_ledger_lines(&txn, entry.id).await? {
            return Err(LedgerError::EntryAlreadyPosted(entry.id));
        }
        if !stored.status.is_editable() {
            return Err(LedgerError::AlreadyPosted(entry.id));
        }
        ensure_version(&stored, commit_input.draft_updated_at)?;

        append_ledger_lines(&txn, entry.id, &commit_input.lines).await?;
        entry_to_active(entry)
            .update(&txn)
            .await
            .map_err(storage_error)?;
        commit(txn).await?;

        debug!(
            entry_id = %entry.id,
            lines = commit_input.lines.len(),
            "Posting committed"
        );
        Ok(())
    }

    async fn commit_reversal(&self, commit_input: &ReversalCommit) -> Result<(), LedgerError> {
        let original_id = commit_input.original.id;
        let reversal = &commit_input.reversal;
        let txn = self.begin().await?;

        let stored = load_entry(&txn, original_id, true)
            .await?
            .ok_or(LedgerError::NotFound(original_id))?;
        lock_accounts(&txn, &stored.account_ids()).await?;
        match stored.status {
            EntryStatus::Posted => {}
            EntryStatus::Draft => return Err(LedgerError::NotPosted(original_id)),
            EntryStatus::Reversed => return Err(LedgerError::AlreadyReversed(original_id)),
        }

        entry_to_active(reversal)
            .insert(&txn)
            .await
            .map_err(storage_error)?;
        insert_journal_lines(&txn, reversal).await?;
        append_ledger_lines(&txn, reversal.id, &commit_input.lines).await?;
        entry_to_active(&commit_input.original)
            .update(&txn)
            .await
            .map_err(storage_error)?;
        commit(txn).await?;

        debug!(
            entry_id = %original_id,
            reversal_id = %reversal.id,
            "Reversal committed"
        );
        Ok(())
    }

    async fn lines_for_account(
        &self,
        account_id: AccountId,
        range: LineRange,
    ) -> Result<Vec<LedgerLine>, LedgerError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let query = ledger_lines::Entity::find()
            .filter(ledger_lines::Column::AccountId.eq(account_id.into_inner()));
        let models = windowed(query, range)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        into_ledger_lines(models)
    }

    async fn lines_for_entry(&self, entry_id: JournalEntryId) -> Result<Vec<LedgerLine>, LedgerError> {
        let models = ledger_lines::Entity::find()
            .filter(ledger_lines::Column::EntryId.eq(entry_id.into_inner()))
            .order_by_asc(ledger_lines::Column::LineNo)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        models
            .into_iter()
            .map(|m| ledger_line_to_domain(m).map_err(LedgerError::from))
            .collect()
    }

    async fn lines_in_range(&self, range: LineRange) -> Result<Vec<LedgerLine>, LedgerError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let models = windowed(ledger_lines::Entity::find(), range)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        into_ledger_lines(models)
    }
}

// ========== Reconciliations ==========

#[async_trait]
impl ReconciliationStore for PgLedgerStore {
    async fn insert_reconciliation(&self, reconciliation: &Reconciliation) -> Result<(), LedgerError> {
        reconciliation_to_active(reconciliation)?
            .insert(&self.db)
            .await
            .map_err(storage_error)?;
        debug!(
            reconciliation_id = %reconciliation.id,
            account_id = %reconciliation.account_id,
            "Reconciliation row inserted"
        );
        Ok(())
    }

    async fn reconciliations_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Reconciliation>, LedgerError> {
        let models = reconciliations::Entity::find()
            .filter(reconciliations::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(reconciliations::Column::CreatedAt)
            .order_by_asc(reconciliations::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        models
            .into_iter()
            .map(|m| reconciliation_to_domain(m).map_err(LedgerError::from))
            .collect()
    }
}

//! Statement reconciliation.

use std::collections::HashSet;

use chrono::Utc;
use tally_shared::types::{AccountId, ActorId, LedgerLineId, ReconciliationId};
use tracing::info;

use super::LedgerEngine;
use crate::ledger::{LedgerError, LedgerLine, checked_sub};
use crate::reconciliation::{Matcher, ReconcileInput, Reconciliation};
use crate::reports::ReportService;
use crate::store::{LineRange, Storage};

impl<S> LedgerEngine<S>
where
    S: Storage + 'static,
{
    /// Matches a statement against the ledger and stores the snapshot.
    ///
    /// Only ledger lines dated on or before the statement date take part,
    /// and a line matched by an earlier snapshot of the same account is not
    /// offered to the matcher again. The ledger balance still covers every
    /// line up to the statement date. The ledger itself is never modified.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account and `AmountOverflow`
    /// if a balance leaves the decimal range.
    pub async fn reconcile(
        &self,
        input: ReconcileInput,
        actor: ActorId,
    ) -> Result<Reconciliation, LedgerError> {
        let account = self.require_account(input.account_id).await?;
        let lines = self
            .store
            .lines_for_account(account.id, LineRange::as_of(input.statement_date))
            .await?;

        let already_matched = self.previously_matched(account.id).await?;
        let candidates: Vec<LedgerLine> = lines
            .iter()
            .filter(|line| !already_matched.contains(&line.id))
            .cloned()
            .collect();

        let matcher = Matcher::new(self.config.reconciliation_date_tolerance_days);
        let outcome = matcher.run(&input.external_lines, &candidates);
        let ledger_balance = ReportService::account_balance(&account, &lines)?.balance;
        let external_balance =
            Matcher::external_balance(&input.external_lines, input.statement_balance)?;

        let reconciliation = Reconciliation {
            id: ReconciliationId::new(),
            account_id: account.id,
            statement_date: input.statement_date,
            external_balance,
            ledger_balance,
            discrepancy: checked_sub(external_balance, ledger_balance)?,
            matched: outcome.matched,
            unmatched_external: outcome.unmatched_external,
            unmatched_ledger: outcome.unmatched_ledger,
            created_by: actor,
            created_at: Utc::now(),
        };
        self.store.insert_reconciliation(&reconciliation).await?;

        info!(
            reconciliation_id = %reconciliation.id,
            account_id = %account.id,
            matched = reconciliation.matched.len(),
            skipped = already_matched.len(),
            discrepancy = %reconciliation.discrepancy,
            actor = %actor,
            "Reconciliation recorded"
        );
        Ok(reconciliation)
    }

    /// Most recent snapshot for an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn latest_reconciliation(
        &self,
        account_id: AccountId,
    ) -> Result<Option<Reconciliation>, LedgerError> {
        Ok(self.reconciliations(account_id).await?.pop())
    }

    /// Every snapshot for an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn reconciliations(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Reconciliation>, LedgerError> {
        self.require_account(account_id).await?;
        self.store.reconciliations_for_account(account_id).await
    }

    async fn previously_matched(
        &self,
        account_id: AccountId,
    ) -> Result<HashSet<LedgerLineId>, LedgerError> {
        Ok(self
            .store
            .reconciliations_for_account(account_id)
            .await?
            .iter()
            .flat_map(|rec| rec.matched.iter().map(|pair| pair.ledger_line_id))
            .collect())
    }
}

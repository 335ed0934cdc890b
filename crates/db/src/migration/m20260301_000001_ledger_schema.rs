//! Ledger schema migration.
//!
//! Creates the enums, the chart of accounts, journal entry documents, the
//! append-only ledger, reconciliation snapshots, and the triggers that keep
//! posted data immutable.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL ENTRIES
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;

        // ============================================================
        // PART 4: LEDGER
        // ============================================================
        db.execute_unprepared(LEDGER_LINES_SQL).await?;

        // ============================================================
        // PART 5: RECONCILIATION
        // ============================================================
        db.execute_unprepared(RECONCILIATIONS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

CREATE TYPE entry_status AS ENUM ('draft', 'posted', 'reversed');

CREATE TYPE entry_side AS ENUM ('debit', 'credit');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    account_type account_type NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    currency CHAR(3) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_code UNIQUE (code),
    CONSTRAINT chk_accounts_currency CHECK (currency ~ '^[A-Z]{3}$'),
    CONSTRAINT chk_accounts_not_own_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    entry_date DATE NOT NULL,
    reference VARCHAR(255) NOT NULL,
    description TEXT NOT NULL,
    status entry_status NOT NULL DEFAULT 'draft',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    posted_at TIMESTAMPTZ,
    posted_by UUID,
    reversal_of UUID REFERENCES journal_entries(id),
    reversed_by UUID REFERENCES journal_entries(id),
    reversal_reason TEXT,
    reversed_at TIMESTAMPTZ,
    reversed_by_actor UUID,
    CONSTRAINT chk_posted_fields CHECK (
        status = 'draft' OR (posted_at IS NOT NULL AND posted_by IS NOT NULL)
    ),
    CONSTRAINT chk_reversed_fields CHECK (
        status <> 'reversed' OR (reversed_by IS NOT NULL AND reversal_reason IS NOT NULL)
    )
);

CREATE UNIQUE INDEX uq_journal_entries_reversal_of
    ON journal_entries(reversal_of) WHERE reversal_of IS NOT NULL;
CREATE INDEX idx_journal_entries_status ON journal_entries(status);
CREATE INDEX idx_journal_entries_date ON journal_entries(entry_date);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    side entry_side NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    description TEXT,
    CONSTRAINT uq_journal_lines_entry_line UNIQUE (entry_id, line_no),
    CONSTRAINT chk_journal_lines_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_journal_lines_line_no CHECK (line_no >= 1)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const LEDGER_LINES_SQL: &str = r"
CREATE TABLE ledger_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id),
    line_no INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    side entry_side NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    normal_side entry_side NOT NULL,
    entry_date DATE NOT NULL,
    posted_at TIMESTAMPTZ NOT NULL,
    description TEXT,
    CONSTRAINT uq_ledger_lines_entry_line UNIQUE (entry_id, line_no),
    CONSTRAINT chk_ledger_lines_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_ledger_lines_account_date ON ledger_lines(account_id, entry_date);
CREATE INDEX idx_ledger_lines_date ON ledger_lines(entry_date);
";

const RECONCILIATIONS_SQL: &str = r"
CREATE TABLE reconciliations (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL REFERENCES accounts(id),
    statement_date DATE NOT NULL,
    external_balance NUMERIC(19, 4) NOT NULL,
    ledger_balance NUMERIC(19, 4) NOT NULL,
    discrepancy NUMERIC(19, 4) NOT NULL,
    matched JSONB NOT NULL DEFAULT '[]',
    unmatched_external JSONB NOT NULL DEFAULT '[]',
    unmatched_ledger JSONB NOT NULL DEFAULT '[]',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_reconciliations_account ON reconciliations(account_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: reject_ledger_mutation
-- Ledger lines and reconciliation snapshots are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION reject_ledger_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION '% is append-only: % rejected', TG_TABLE_NAME, TG_OP;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_ledger_lines_append_only
BEFORE UPDATE OR DELETE ON ledger_lines
FOR EACH ROW
EXECUTE FUNCTION reject_ledger_mutation();

CREATE TRIGGER trg_reconciliations_append_only
BEFORE UPDATE OR DELETE ON reconciliations
FOR EACH ROW
EXECUTE FUNCTION reject_ledger_mutation();

-- ============================================================
-- FUNCTION: check_posted_balance
-- The ledger lines of every entry must balance at commit
-- ============================================================
CREATE OR REPLACE FUNCTION check_posted_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(19, 4);
    total_credit NUMERIC(19, 4);
BEGIN
    SELECT
        COALESCE(SUM(amount) FILTER (WHERE side = 'debit'), 0),
        COALESCE(SUM(amount) FILTER (WHERE side = 'credit'), 0)
    INTO total_debit, total_credit
    FROM ledger_lines
    WHERE entry_id = NEW.entry_id;

    IF total_debit <> total_credit THEN
        RAISE EXCEPTION 'Entry % is not balanced. Debit: %, Credit: %',
            NEW.entry_id, total_debit, total_credit;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_ledger_lines_balanced
AFTER INSERT ON ledger_lines
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_posted_balance();

-- ============================================================
-- FUNCTION: prevent_posted_modification
-- Posted entries only change by being reversed; reversed entries never change
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        IF OLD.status <> 'draft' THEN
            RAISE EXCEPTION 'Cannot delete % journal entry %', OLD.status, OLD.id;
        END IF;
        RETURN OLD;
    END IF;

    IF OLD.status = 'posted' AND NEW.status <> 'reversed' THEN
        RAISE EXCEPTION 'Cannot modify posted journal entry. Reverse it instead.';
    END IF;

    IF OLD.status = 'reversed' THEN
        RAISE EXCEPTION 'Cannot modify reversed journal entry.';
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_posted_mod
BEFORE UPDATE OR DELETE ON journal_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_modification();

-- ============================================================
-- FUNCTION: prevent_posted_line_modification
-- Journal lines are editable only while their entry is a draft
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_line_modification()
RETURNS TRIGGER AS $$
DECLARE
    entry_status_val entry_status;
BEGIN
    SELECT status INTO entry_status_val
    FROM journal_entries
    WHERE id = COALESCE(NEW.entry_id, OLD.entry_id);

    IF entry_status_val IS NOT NULL AND entry_status_val <> 'draft' THEN
        RAISE EXCEPTION 'Cannot modify lines of % journal entry', entry_status_val;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_posted_line_mod
BEFORE UPDATE OR DELETE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_line_modification();
";

const DROP_ALL_SQL: &str = r"
-- Drop triggers
DROP TRIGGER IF EXISTS trg_prevent_posted_line_mod ON journal_lines;
DROP TRIGGER IF EXISTS trg_prevent_posted_mod ON journal_entries;
DROP TRIGGER IF EXISTS trg_ledger_lines_balanced ON ledger_lines;
DROP TRIGGER IF EXISTS trg_reconciliations_append_only ON reconciliations;
DROP TRIGGER IF EXISTS trg_ledger_lines_append_only ON ledger_lines;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_posted_line_modification();
DROP FUNCTION IF EXISTS prevent_posted_modification();
DROP FUNCTION IF EXISTS check_posted_balance();
DROP FUNCTION IF EXISTS reject_ledger_mutation();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS reconciliations CASCADE;
DROP TABLE IF EXISTS ledger_lines CASCADE;
DROP TABLE IF EXISTS journal_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

-- Drop enums
DROP TYPE IF EXISTS entry_side CASCADE;
DROP TYPE IF EXISTS entry_status CASCADE;
DROP TYPE IF EXISTS account_type CASCADE;
";

//! Initial database migration.
//!
//! Creates the ledger tables together with the guards that back the engine's
//! invariants: non-negative amounts, unique account names and codes per
//! business, at most one reversal per entry, and a deferred trigger that
//! rejects any unbalanced entry at commit.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 0: ENUM TYPES
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 1: BUSINESSES & CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(BUSINESSES_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;

        // ============================================================
        // PART 2: CURRENCY
        // ============================================================
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;
        db.execute_unprepared(TRANSACTION_RECORDS_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'revenue', 'expense');
CREATE TYPE category_kind AS ENUM ('income', 'expense');
CREATE TYPE entry_status AS ENUM ('posted', 'void');
CREATE TYPE line_side AS ENUM ('debit', 'credit');
CREATE TYPE ledger_status AS ENUM ('synced', 'failed');
";

const BUSINESSES_SQL: &str = r"
CREATE TABLE businesses (
    id              UUID PRIMARY KEY,
    name            VARCHAR(255) NOT NULL,
    base_currency   VARCHAR(3) NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_business_name CHECK (LENGTH(TRIM(name)) > 0),
    CONSTRAINT chk_business_currency CHECK (base_currency ~ '^[A-Z]{3}$')
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id              UUID PRIMARY KEY,
    business_id     UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    code            VARCHAR(20) NOT NULL,
    name            VARCHAR(255) NOT NULL,
    account_type    account_type NOT NULL,
    is_default      BOOLEAN NOT NULL DEFAULT false,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_account_name UNIQUE (business_id, name),
    CONSTRAINT uq_account_code UNIQUE (business_id, code)
);

CREATE INDEX idx_accounts_business ON accounts(business_id);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id              UUID PRIMARY KEY,
    business_id     UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    name            VARCHAR(255) NOT NULL,
    kind            category_kind NOT NULL,
    account_id      UUID NOT NULL REFERENCES accounts(id),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_category_name UNIQUE (business_id, name)
);
";

const EXCHANGE_RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id              UUID PRIMARY KEY,
    business_id     UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    from_currency   VARCHAR(3) NOT NULL,
    to_currency     VARCHAR(3) NOT NULL,
    rate            NUMERIC(19, 10) NOT NULL,
    effective_date  DATE NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_exchange_rate UNIQUE (business_id, from_currency, to_currency, effective_date),
    CONSTRAINT chk_rate_positive CHECK (rate > 0),
    CONSTRAINT chk_different_currencies CHECK (from_currency <> to_currency)
);

CREATE INDEX idx_exchange_rates_lookup
    ON exchange_rates(business_id, from_currency, to_currency, effective_date DESC);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id                  UUID PRIMARY KEY,
    business_id         UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    transaction_date    DATE NOT NULL,
    description         TEXT NOT NULL,
    status              entry_status NOT NULL DEFAULT 'posted',
    reversal_entry_id   UUID REFERENCES journal_entries(id),
    reverses_entry_id   UUID REFERENCES journal_entries(id),
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- At most one reversal per original
    CONSTRAINT uq_reverses_entry UNIQUE (reverses_entry_id),
    CONSTRAINT chk_entry_status CHECK (
        (status = 'posted' AND reversal_entry_id IS NULL)
        OR (status = 'void' AND reversal_entry_id IS NOT NULL)
    ),
    CONSTRAINT chk_not_self_reversal CHECK (reverses_entry_id <> id)
);

CREATE INDEX idx_journal_entries_business_date
    ON journal_entries(business_id, transaction_date, created_at);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id                  UUID PRIMARY KEY,
    journal_entry_id    UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id          UUID NOT NULL REFERENCES accounts(id),
    line_number         INTEGER NOT NULL,
    side                line_side NOT NULL,
    amount              NUMERIC(19, 4) NOT NULL,

    CONSTRAINT uq_line_number UNIQUE (journal_entry_id, line_number),
    CONSTRAINT chk_line_amount CHECK (amount >= 0)
);

CREATE INDEX idx_journal_lines_entry ON journal_lines(journal_entry_id);
CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const TRANSACTION_RECORDS_SQL: &str = r"
CREATE TABLE transaction_records (
    id                  UUID PRIMARY KEY,
    business_id         UUID NOT NULL REFERENCES businesses(id) ON DELETE CASCADE,
    category_id         UUID NOT NULL REFERENCES categories(id),
    transaction_date    DATE NOT NULL,
    amount              NUMERIC(19, 4) NOT NULL,
    currency            VARCHAR(3) NOT NULL,
    description         TEXT NOT NULL,
    ledger_status       ledger_status NOT NULL,
    journal_entry_id    UUID REFERENCES journal_entries(id),
    failure_reason      TEXT,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_ledger_status CHECK (
        (ledger_status = 'synced' AND journal_entry_id IS NOT NULL)
        OR (ledger_status = 'failed' AND journal_entry_id IS NULL)
    )
);

CREATE INDEX idx_transaction_records_business ON transaction_records(business_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_entry_balance
-- Rejects entries whose debits and credits disagree, at commit time
-- ============================================================
CREATE OR REPLACE FUNCTION check_entry_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(19, 4);
    total_credit NUMERIC(19, 4);
    line_count INTEGER;
BEGIN
    SELECT
        COALESCE(SUM(amount) FILTER (WHERE side = 'debit'), 0),
        COALESCE(SUM(amount) FILTER (WHERE side = 'credit'), 0),
        COUNT(*)
    INTO total_debit, total_credit, line_count
    FROM journal_lines
    WHERE journal_entry_id = NEW.journal_entry_id;

    IF line_count < 2 THEN
        RAISE EXCEPTION 'Journal entry % needs at least two lines', NEW.journal_entry_id;
    END IF;

    IF ABS(total_debit - total_credit) > 0.0001 THEN
        RAISE EXCEPTION 'Journal entry is not balanced. Debit: %, Credit: %',
            total_debit, total_credit;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_entry_balance
AFTER INSERT OR UPDATE ON journal_lines
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_entry_balance();

-- ============================================================
-- FUNCTION: prevent_line_modification
-- Lines are written once; corrections go through reversing entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_line_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Journal lines are immutable. Void the entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_line_update
BEFORE UPDATE ON journal_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_line_modification();

-- ============================================================
-- FUNCTION: guard_entry_update
-- The only allowed change to an entry is posted -> void
-- ============================================================
CREATE OR REPLACE FUNCTION guard_entry_update()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status <> 'posted' OR NEW.status <> 'void'
        OR NEW.transaction_date <> OLD.transaction_date
        OR NEW.description <> OLD.description
        OR NEW.business_id <> OLD.business_id
        OR NEW.reverses_entry_id IS DISTINCT FROM OLD.reverses_entry_id THEN
        RAISE EXCEPTION 'Journal entries only change from posted to void';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_guard_entry_update
BEFORE UPDATE ON journal_entries
FOR EACH ROW
EXECUTE FUNCTION guard_entry_update();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS transaction_records;
DROP TABLE IF EXISTS journal_lines;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS exchange_rates;
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS businesses;
DROP FUNCTION IF EXISTS check_entry_balance();
DROP FUNCTION IF EXISTS prevent_line_modification();
DROP FUNCTION IF EXISTS guard_entry_update();
DROP TYPE IF EXISTS ledger_status;
DROP TYPE IF EXISTS line_side;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS category_kind;
DROP TYPE IF EXISTS account_type;
";

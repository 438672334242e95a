//! SQL schema for the Lembrete SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per installment. The table is rewritten wholesale on every save;
-- `position` keeps the collection order stable across load/save cycles.
CREATE TABLE IF NOT EXISTS payment_plans (
    plan_id             TEXT PRIMARY KEY,
    series_id           TEXT NOT NULL,
    client_name         TEXT NOT NULL,
    amount              TEXT NOT NULL,      -- decimal string, e.g. '150.00'
    due_date            TEXT NOT NULL,      -- YYYY-MM-DD
    created_at          TEXT NOT NULL,      -- RFC 3339 UTC
    paid_at             TEXT,
    active              INTEGER NOT NULL,
    notification_timing TEXT,               -- 'on_due_date' | 'next_week'
    analysis_id         TEXT,
    cadence             TEXT NOT NULL,      -- 'monthly' | 'weekly'
    installment         INTEGER NOT NULL,
    total               INTEGER NOT NULL,
    due_day             INTEGER,            -- monthly only
    position            INTEGER NOT NULL,
    CHECK (installment BETWEEN 1 AND total)
);

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    client_name    TEXT NOT NULL,
    date           TEXT NOT NULL,
    service_type   TEXT NOT NULL,
    amount         TEXT NOT NULL,
    paid           INTEGER NOT NULL,
    notes          TEXT,
    created_at     TEXT NOT NULL,
    position       INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS payment_plans_series_idx ON payment_plans(series_id);
CREATE INDEX IF NOT EXISTS payment_plans_client_idx ON payment_plans(client_name);

PRAGMA user_version = 1;
";

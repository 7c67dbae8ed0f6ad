//! SQL schema for the Covey SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id               TEXT PRIMARY KEY,
    first_name               TEXT NOT NULL,
    last_name                TEXT,
    account_type             TEXT NOT NULL DEFAULT 'INDIVIDUAL',
    parent_account_id        TEXT REFERENCES accounts(account_id),
    sub_account_history_from TEXT,
    creation_date            TEXT NOT NULL,
    CHECK ((account_type = 'SUBACCOUNT') = (parent_account_id IS NOT NULL))
);

-- Ids are never reused, so creation order is id order.
CREATE TABLE IF NOT EXISTS invitations (
    invitation_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_account_id  TEXT NOT NULL REFERENCES accounts(account_id),
    sub_account_id     TEXT NOT NULL REFERENCES accounts(account_id),
    status             TEXT NOT NULL DEFAULT 'NO_ACTION',
    invitation_date    TEXT NOT NULL,
    status_change_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    order_id   TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(account_id),
    order_date TEXT NOT NULL   -- fixed-width RFC 3339, compared as text
);

CREATE INDEX IF NOT EXISTS accounts_parent_idx     ON accounts(parent_account_id);
CREATE INDEX IF NOT EXISTS invitations_sub_idx     ON invitations(sub_account_id, status);
CREATE INDEX IF NOT EXISTS orders_account_date_idx ON orders(account_id, order_date);

PRAGMA user_version = 1;
";

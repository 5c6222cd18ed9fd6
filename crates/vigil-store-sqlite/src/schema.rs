//! SQL schema for the Vigil state store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Grow-only set of ticket ids this client has observed.
-- Rows are only ever inserted, never replaced or deleted.
CREATE TABLE IF NOT EXISTS seen_tickets (
    ticket_id     TEXT PRIMARY KEY,
    first_seen_at TEXT NOT NULL     -- ISO 8601 UTC
);

-- Notification feed history, pruned to a fixed number of rows.
CREATE TABLE IF NOT EXISTS notifications (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    source      TEXT NOT NULL,
    created_at  TEXT NOT NULL       -- ISO 8601 UTC
);

PRAGMA user_version = 1;
";

//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database. The desk and
//! the allocator call store methods — they never execute SQL.

use crate::error::DeskResult;
use rusqlite::{params, Connection};

mod artifact;
mod audit;
mod catalog;
mod event;
mod ledger;

pub use artifact::PreviewArtifact;
pub use audit::AuditEntry;
pub use event::EventRecord;
pub use ledger::LedgerRow;

pub struct DeskStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases this returns a fresh, isolated one.
    pub fn reopen(&self) -> DeskResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/002_catalog_policy.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/003_preview_commit.sql"))?;
        self.conn
            .execute_batch(include_str!("../../migrations/004_audit.sql"))?;
        Ok(())
    }

    // ── Throttle policy overrides ──────────────────────────────

    pub fn set_policy_value(&self, key: &str, value: f64) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO throttle_policy (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn policy_value(&self, key: &str) -> DeskResult<Option<f64>> {
        use rusqlite::OptionalExtension;
        let value = self
            .conn
            .prepare("SELECT value FROM throttle_policy WHERE key = ?1")?
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }
}

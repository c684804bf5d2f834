use super::DeskStore;
use crate::error::DeskResult;
use rusqlite::params;

/// One audit row per preview and per commit attempt, success or not.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub scope_id: String,
    pub action: String,
    pub seed: String,
    pub hash: String,
    pub band: String,
    pub outcome: String,
    pub detail: Option<String>,
    pub created_at: String,
}

impl DeskStore {
    pub fn append_audit(&self, entry: &AuditEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO audit_log
                (scope_id, action, seed, hash, band, outcome, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.scope_id,
                entry.action,
                entry.seed,
                entry.hash,
                entry.band,
                entry.outcome,
                entry.detail,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn audit_for_scope(&self, scope_id: &str) -> DeskResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT scope_id, action, seed, hash, band, outcome, detail, created_at
             FROM audit_log WHERE scope_id = ?1 ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![scope_id], |row| {
                Ok(AuditEntry {
                    scope_id: row.get(0)?,
                    action: row.get(1)?,
                    seed: row.get(2)?,
                    hash: row.get(3)?,
                    band: row.get(4)?,
                    outcome: row.get(5)?,
                    detail: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

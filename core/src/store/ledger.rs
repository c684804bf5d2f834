use super::DeskStore;
use crate::{
    allocator::{AllocationLine, ScopeType},
    error::{DeskError, DeskResult},
};
use rusqlite::params;

/// Spent-pool ledger row. Append-only: a correction is a new row with
/// `reverted = true` under the original batch id, never an edit.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub id: i64,
    pub scope_id: String,
    pub item_code: String,
    pub item_name: String,
    pub level: u32,
    pub qty: i64,
    pub cogs: f64,
    pub committed_at: String,
    pub batch_id: String,
    pub reverted: bool,
    pub scope_type: String,
}

impl DeskStore {
    /// The commit write phase: assignments, stock decrements, and
    /// ledger rows land in ONE transaction, and the artifact dies with
    /// them. Stock is decremented with a conditional update so the
    /// check-and-decrement is a single atomic statement; a miss means
    /// another commit took the last unit, and the whole transaction
    /// rolls back.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_allocation(
        &mut self,
        event_id: &str,
        scope_id: &str,
        scope_type: ScopeType,
        lines: &[AllocationLine],
        batch_id: &str,
        artifact_id: &str,
        committed_at: &str,
    ) -> DeskResult<()> {
        let tx = self.conn.transaction()?;

        for line in lines {
            tx.execute(
                "INSERT INTO prize_assignment
                    (event_id, player, scope_id, item_code, item_name, qty, batch_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(scope_id, player) DO UPDATE SET
                    item_code = excluded.item_code,
                    item_name = excluded.item_name,
                    qty = excluded.qty,
                    batch_id = excluded.batch_id",
                params![
                    event_id,
                    line.player,
                    scope_id,
                    line.item_code,
                    line.item_name,
                    line.qty,
                    batch_id,
                ],
            )?;

            let updated = tx.execute(
                "UPDATE catalog_item SET stock = stock - ?1
                 WHERE code = ?2 AND stock >= ?1",
                params![line.qty, line.item_code],
            )?;
            if updated != 1 {
                return Err(DeskError::StockExhausted {
                    item_code: line.item_code.clone(),
                });
            }

            tx.execute(
                "INSERT INTO spent_pool
                    (scope_id, item_code, item_name, level, qty, cogs,
                     committed_at, batch_id, reverted, scope_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                params![
                    scope_id,
                    line.item_code,
                    line.item_name,
                    line.level as i64,
                    line.qty,
                    line.cogs,
                    committed_at,
                    batch_id,
                    scope_type.label(),
                ],
            )?;
        }

        tx.execute(
            "DELETE FROM preview_artifact WHERE artifact_id = ?1",
            params![artifact_id],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Bulk reversal of one commit: append a `reverted` row per
    /// original row, restore the stock, and clear the assignments.
    /// Returns the number of rows reverted.
    pub fn revert_batch(&mut self, batch_id: &str, reverted_at: &str) -> DeskResult<usize> {
        let rows = self.rows_for_batch(batch_id)?;
        if rows.is_empty() {
            return Err(DeskError::BatchNotFound {
                batch_id: batch_id.to_string(),
            });
        }
        if rows.iter().any(|r| r.reverted) {
            return Err(DeskError::BatchAlreadyReverted {
                batch_id: batch_id.to_string(),
            });
        }
        let originals: Vec<&LedgerRow> = rows.iter().collect();

        let tx = self.conn.transaction()?;
        for row in &originals {
            tx.execute(
                "INSERT INTO spent_pool
                    (scope_id, item_code, item_name, level, qty, cogs,
                     committed_at, batch_id, reverted, scope_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
                params![
                    row.scope_id,
                    row.item_code,
                    row.item_name,
                    row.level as i64,
                    row.qty,
                    row.cogs,
                    reverted_at,
                    batch_id,
                    row.scope_type,
                ],
            )?;
            tx.execute(
                "UPDATE catalog_item SET stock = stock + ?1 WHERE code = ?2",
                params![row.qty, row.item_code],
            )?;
        }
        tx.execute(
            "DELETE FROM prize_assignment WHERE batch_id = ?1",
            params![batch_id],
        )?;
        tx.commit()?;
        Ok(originals.len())
    }

    pub fn rows_for_batch(&self, batch_id: &str) -> DeskResult<Vec<LedgerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope_id, item_code, item_name, level, qty, cogs,
                    committed_at, batch_id, reverted, scope_type
             FROM spent_pool WHERE batch_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![batch_id], map_ledger_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn rows_for_scope(&self, scope_id: &str) -> DeskResult<Vec<LedgerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope_id, item_code, item_name, level, qty, cogs,
                    committed_at, batch_id, reverted, scope_type
             FROM spent_pool WHERE scope_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![scope_id], map_ledger_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Net spend for a scope. Reversal rows carry negative weight, so
    /// a fully reverted batch nets to zero.
    pub fn spent_for_scope(&self, scope_id: &str) -> DeskResult<f64> {
        let spent = self
            .conn
            .prepare(
                "SELECT COALESCE(SUM(
                    CASE WHEN reverted THEN -qty * cogs ELSE qty * cogs END
                 ), 0.0)
                 FROM spent_pool WHERE scope_id = ?1",
            )?
            .query_row(params![scope_id], |row| row.get(0))?;
        Ok(spent)
    }

    /// Net committed quantity for an item across all scopes.
    pub fn committed_qty_for_item(&self, item_code: &str) -> DeskResult<i64> {
        let qty = self
            .conn
            .prepare(
                "SELECT COALESCE(SUM(CASE WHEN reverted THEN -qty ELSE qty END), 0)
                 FROM spent_pool WHERE item_code = ?1",
            )?
            .query_row(params![item_code], |row| row.get(0))?;
        Ok(qty)
    }
}

fn map_ledger_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerRow> {
    Ok(LedgerRow {
        id: row.get(0)?,
        scope_id: row.get(1)?,
        item_code: row.get(2)?,
        item_name: row.get(3)?,
        level: row.get::<_, i64>(4)? as u32,
        qty: row.get(5)?,
        cogs: row.get(6)?,
        committed_at: row.get(7)?,
        batch_id: row.get(8)?,
        reverted: row.get::<_, i64>(9)? != 0,
        scope_type: row.get(10)?,
    })
}

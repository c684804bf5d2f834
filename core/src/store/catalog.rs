use super::DeskStore;
use crate::{allocator::CatalogItem, error::DeskResult};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    pub fn upsert_catalog_item(&self, item: &CatalogItem) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO catalog_item (
                code, name, level, cogs, expected_value, stock,
                eligible_round, eligible_end, min_player_threshold
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                level = excluded.level,
                cogs = excluded.cogs,
                expected_value = excluded.expected_value,
                stock = excluded.stock,
                eligible_round = excluded.eligible_round,
                eligible_end = excluded.eligible_end,
                min_player_threshold = excluded.min_player_threshold",
            params![
                item.code,
                item.name,
                item.level as i64,
                item.cogs,
                item.expected_value,
                item.stock,
                if item.eligible_round { 1i64 } else { 0i64 },
                if item.eligible_end { 1i64 } else { 0i64 },
                item.min_player_threshold as i64,
            ],
        )?;
        Ok(())
    }

    /// Read-only snapshot of the whole catalog, code ascending.
    pub fn catalog_snapshot(&self) -> DeskResult<Vec<CatalogItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, name, level, cogs, expected_value, stock,
                    eligible_round, eligible_end, min_player_threshold
             FROM catalog_item ORDER BY code ASC",
        )?;
        let items = stmt
            .query_map([], |row| {
                Ok(CatalogItem {
                    code: row.get(0)?,
                    name: row.get(1)?,
                    level: row.get::<_, i64>(2)? as u32,
                    cogs: row.get(3)?,
                    expected_value: row.get(4)?,
                    stock: row.get(5)?,
                    eligible_round: row.get::<_, i64>(6)? != 0,
                    eligible_end: row.get::<_, i64>(7)? != 0,
                    min_player_threshold: row.get::<_, i64>(8)? as u32,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn stock_of(&self, code: &str) -> DeskResult<Option<i64>> {
        let stock = self
            .conn
            .prepare("SELECT stock FROM catalog_item WHERE code = ?1")?
            .query_row(params![code], |row| row.get(0))
            .optional()?;
        Ok(stock)
    }
}

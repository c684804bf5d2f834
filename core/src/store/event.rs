use super::DeskStore;
use crate::{allocator::RosterEntry, error::DeskResult};
use rusqlite::{params, OptionalExtension};

/// Event header row as stored.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_id: String,
    pub name: String,
    pub entry_fee: f64,
    pub kit_cost_per_player: f64,
}

impl DeskStore {
    pub fn insert_event(
        &self,
        event_id: &str,
        name: &str,
        entry_fee: f64,
        kit_cost_per_player: f64,
        created_at: &str,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event (event_id, name, entry_fee, kit_cost_per_player, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event_id, name, entry_fee, kit_cost_per_player, created_at],
        )?;
        Ok(())
    }

    pub fn event(&self, event_id: &str) -> DeskResult<Option<EventRecord>> {
        let record = self
            .conn
            .prepare(
                "SELECT event_id, name, entry_fee, kit_cost_per_player
                 FROM event WHERE event_id = ?1",
            )?
            .query_row(params![event_id], |row| {
                Ok(EventRecord {
                    event_id: row.get(0)?,
                    name: row.get(1)?,
                    entry_fee: row.get(2)?,
                    kit_cost_per_player: row.get(3)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn insert_roster_entry(&self, event_id: &str, player: &str, rank: u32) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO roster (event_id, player, rank) VALUES (?1, ?2, ?3)",
            params![event_id, player, rank as i64],
        )?;
        Ok(())
    }

    pub fn set_roster_rank(&self, event_id: &str, player: &str, rank: u32) -> DeskResult<()> {
        self.conn.execute(
            "UPDATE roster SET rank = ?1 WHERE event_id = ?2 AND player = ?3",
            params![rank as i64, event_id, player],
        )?;
        Ok(())
    }

    /// Full roster for an event, rank ascending.
    pub fn roster(&self, event_id: &str) -> DeskResult<Vec<RosterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT player, rank FROM roster WHERE event_id = ?1 ORDER BY rank ASC",
        )?;
        let entries = stmt
            .query_map(params![event_id], |row| {
                Ok(RosterEntry {
                    player: row.get(0)?,
                    rank: row.get::<_, i64>(1)? as u32,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

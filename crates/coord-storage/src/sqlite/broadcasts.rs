//! Append-only broadcast log for [`SqliteStore`].

use rusqlite::{params, Row};

use coord_core::{Broadcast, BroadcastEventType, Metadata};

use crate::error::Result;
use crate::sqlite::store::SqliteStore;

fn scan_broadcast(row: &Row<'_>) -> rusqlite::Result<Broadcast> {
    let event_type_str: String = row.get("event_type")?;
    let payload_str: String = row.get("payload")?;
    Ok(Broadcast {
        id: row.get("id")?,
        event_type: event_type_str.parse().unwrap_or(BroadcastEventType::Completed),
        issue_id: row.get("issue_id")?,
        agent_id: row.get("agent_id")?,
        payload: Metadata::from_json_str(&payload_str),
        created_at: row.get("created_at")?,
    })
}

impl SqliteStore {
    /// Appends a broadcast row. Propagates lock/insert errors like every
    /// other `*_impl` method here; best-effort swallowing is the caller's
    /// job (component-level `emit_broadcast`/`broadcast` helpers), not
    /// storage's.
    pub fn append_broadcast_impl(&self, broadcast: &Broadcast) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO broadcasts (event_type, issue_id, agent_id, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                broadcast.event_type.as_str(),
                broadcast.issue_id,
                broadcast.agent_id,
                broadcast.payload.to_json_string(),
                broadcast.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_broadcasts_since_impl(&self, since_id: i64, limit: i64) -> Result<Vec<Broadcast>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, event_type, issue_id, agent_id, payload, created_at
             FROM broadcasts WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![since_id, limit], scan_broadcast)?;
        let mut broadcasts = Vec::new();
        for row in rows {
            broadcasts.push(row?);
        }
        Ok(broadcasts)
    }
}

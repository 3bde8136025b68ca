//! Health snapshot history for [`SqliteStore`].

use rusqlite::{params, Row};

use coord_core::HealthSnapshot;

use crate::error::Result;
use crate::sqlite::store::SqliteStore;

const HEALTH_COLUMNS: &str = "coherence, velocity, blockage, staleness, claim_health, agent_health, recorded_at";

fn scan_health(row: &Row<'_>) -> rusqlite::Result<HealthSnapshot> {
    Ok(HealthSnapshot {
        coherence: row.get("coherence")?,
        velocity: row.get("velocity")?,
        blockage: row.get("blockage")?,
        staleness: row.get("staleness")?,
        claim_health: row.get("claim_health")?,
        agent_health: row.get("agent_health")?,
        recorded_at: row.get("recorded_at")?,
    })
}

impl SqliteStore {
    pub fn insert_health_snapshot_impl(&self, snapshot: &HealthSnapshot) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            &format!("INSERT INTO health_snapshots ({HEALTH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                snapshot.coherence,
                snapshot.velocity,
                snapshot.blockage,
                snapshot.staleness,
                snapshot.claim_health,
                snapshot.agent_health,
                snapshot.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_health_snapshots_since_impl(&self, since: i64) -> Result<Vec<HealthSnapshot>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {HEALTH_COLUMNS} FROM health_snapshots WHERE recorded_at >= ?1 ORDER BY recorded_at ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![since], scan_health)?;
        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?);
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn insert_and_list_snapshots() {
        let store = test_store();
        let snapshot = HealthSnapshot {
            coherence: 0.9,
            velocity: 2.0,
            blockage: 0.1,
            staleness: 300.0,
            claim_health: 0.8,
            agent_health: 1.0,
            recorded_at: 100,
        };
        store.insert_health_snapshot_impl(&snapshot).unwrap();

        let listed = store.list_health_snapshots_since_impl(0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].coherence, 0.9);

        assert!(store.list_health_snapshots_since_impl(200).unwrap().is_empty());
    }
}

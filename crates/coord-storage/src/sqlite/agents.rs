//! Agent registry operations for [`SqliteStore`].

use std::collections::BTreeSet;

use rusqlite::{params, Row};

use coord_core::{Agent, AgentStatus, Metadata};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

const AGENT_COLUMNS: &str = "agent_id, capabilities, status, last_seen_at, metadata";

fn scan_agent(row: &Row<'_>) -> rusqlite::Result<Agent> {
    let status_str: String = row.get("status")?;
    let capabilities_str: String = row.get("capabilities")?;
    let metadata_str: String = row.get("metadata")?;
    let capabilities: BTreeSet<String> = serde_json::from_str(&capabilities_str).unwrap_or_default();
    Ok(Agent {
        agent_id: row.get("agent_id")?,
        capabilities,
        status: status_str.parse().unwrap_or(AgentStatus::Active),
        last_seen_at: row.get("last_seen_at")?,
        metadata: Metadata::from_json_str(&metadata_str),
    })
}

impl SqliteStore {
    pub fn upsert_agent_impl(&self, agent: &Agent) -> Result<()> {
        let conn = self.lock_conn()?;
        let capabilities_str = serde_json::to_string(&agent.capabilities).unwrap_or_else(|_| "[]".into());
        conn.execute(
            &format!(
                "INSERT INTO agents ({AGENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(agent_id) DO UPDATE SET
                   capabilities = excluded.capabilities,
                   status = excluded.status,
                   last_seen_at = excluded.last_seen_at,
                   metadata = excluded.metadata"
            ),
            params![
                agent.agent_id,
                capabilities_str,
                agent.status.as_str(),
                agent.last_seen_at,
                agent.metadata.to_json_string(),
            ],
        )?;
        Ok(())
    }

    pub fn get_agent_impl(&self, agent_id: &str) -> Result<Agent> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents WHERE agent_id = ?1");
        conn.query_row(&sql, params![agent_id], scan_agent).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("agent", agent_id),
            other => StorageError::Query(other),
        })
    }

    pub fn list_agents_impl(&self) -> Result<Vec<Agent>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY agent_id ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_agent)?;
        let mut agents = Vec::new();
        for row in rows {
            agents.push(row?);
        }
        Ok(agents)
    }

    pub fn mark_agent_status_impl(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE agents SET status = ?1 WHERE agent_id = ?2",
            params![status.as_str(), agent_id],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("agent", agent_id));
        }
        Ok(())
    }

    pub fn touch_agent_heartbeat_impl(&self, agent_id: &str, now: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE agents SET status = ?1, last_seen_at = ?2 WHERE agent_id = ?3",
            params![AgentStatus::Active.as_str(), now, agent_id],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("agent", agent_id));
        }
        Ok(())
    }
}

//! Outcome append-only log for [`SqliteStore`].

use rusqlite::{params, Row};

use coord_core::{Metadata, Outcome, OutcomeResult};

use crate::error::Result;
use crate::sqlite::store::SqliteStore;

const OUTCOME_COLUMNS: &str = "id, issue_id, agent_id, result, learnings, metadata, recorded_at";

fn scan_outcome(row: &Row<'_>) -> rusqlite::Result<Outcome> {
    let result_str: String = row.get("result")?;
    let metadata_str: String = row.get("metadata")?;
    Ok(Outcome {
        id: row.get("id")?,
        issue_id: row.get("issue_id")?,
        agent_id: row.get("agent_id")?,
        result: result_str.parse().unwrap_or(OutcomeResult::Failure),
        learnings: row.get("learnings")?,
        metadata: Metadata::from_json_str(&metadata_str),
        recorded_at: row.get("recorded_at")?,
    })
}

impl SqliteStore {
    pub fn record_outcome_impl(&self, outcome: &Outcome) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            &format!("INSERT INTO outcomes ({OUTCOME_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                outcome.id,
                outcome.issue_id,
                outcome.agent_id,
                outcome.result.as_str(),
                outcome.learnings,
                outcome.metadata.to_json_string(),
                outcome.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_outcomes_impl(&self, issue_id: &str) -> Result<Vec<Outcome>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {OUTCOME_COLUMNS} FROM outcomes WHERE issue_id = ?1 ORDER BY recorded_at ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![issue_id], scan_outcome)?;
        let mut outcomes = Vec::new();
        for row in rows {
            outcomes.push(row?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::IssueBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn record_and_list_outcomes() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("x").build("iss-o1", 100)).unwrap();

        let outcome = Outcome {
            id: "out-1".into(),
            issue_id: "iss-o1".into(),
            agent_id: "agent-1".into(),
            result: OutcomeResult::Success,
            learnings: "worked".into(),
            metadata: Metadata::new(),
            recorded_at: 150,
        };
        store.record_outcome_impl(&outcome).unwrap();

        let listed = store.list_outcomes_impl("iss-o1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].result, OutcomeResult::Success);
    }
}

//! Claim (exclusive lease) operations for [`SqliteStore`].

use rusqlite::{params, Row};

use coord_core::Claim;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

const CLAIM_COLUMNS: &str = "issue_id, agent_id, claimed_at, expires_at, heartbeat_at";

fn scan_claim(row: &Row<'_>) -> rusqlite::Result<Claim> {
    Ok(Claim {
        issue_id: row.get("issue_id")?,
        agent_id: row.get("agent_id")?,
        claimed_at: row.get("claimed_at")?,
        expires_at: row.get("expires_at")?,
        heartbeat_at: row.get("heartbeat_at")?,
    })
}

impl SqliteStore {
    /// Inserts the claim iff no row exists yet for `claim.issue_id`. The
    /// primary key constraint is what makes the race safe -- this never
    /// reads-then-writes.
    pub fn try_insert_claim_impl(&self, claim: &Claim) -> Result<bool> {
        let conn = self.lock_conn()?;
        let result = conn.execute(
            &format!("INSERT INTO claims ({CLAIM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![claim.issue_id, claim.agent_id, claim.claimed_at, claim.expires_at, claim.heartbeat_at],
        );
        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(other) => Err(StorageError::Query(other)),
        }
    }

    pub fn get_claim_impl(&self, issue_id: &str) -> Result<Option<Claim>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE issue_id = ?1");
        match conn.query_row(&sql, params![issue_id], scan_claim) {
            Ok(claim) => Ok(Some(claim)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StorageError::Query(other)),
        }
    }

    pub fn refresh_claim_heartbeat_impl(&self, issue_id: &str, now: i64) -> Result<bool> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "UPDATE claims SET heartbeat_at = ?1 WHERE issue_id = ?2",
            params![now, issue_id],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_claim_if_held_impl(&self, issue_id: &str, agent_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "DELETE FROM claims WHERE issue_id = ?1 AND agent_id = ?2",
            params![issue_id, agent_id],
        )?;
        Ok(affected > 0)
    }

    pub fn delete_claim_impl(&self, issue_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM claims WHERE issue_id = ?1", params![issue_id])?;
        Ok(affected > 0)
    }

    pub fn list_expired_claims_impl(&self, now: i64) -> Result<Vec<Claim>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE expires_at IS NOT NULL AND expires_at <= ?1");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![now], scan_claim)?;
        let mut claims = Vec::new();
        for row in rows {
            claims.push(row?);
        }
        Ok(claims)
    }

    pub fn get_agent_claims_impl(&self, agent_id: &str) -> Result<Vec<Claim>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE agent_id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![agent_id], scan_claim)?;
        let mut claims = Vec::new();
        for row in rows {
            claims.push(row?);
        }
        Ok(claims)
    }

    pub fn list_active_claims_impl(&self) -> Result<Vec<Claim>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_claim)?;
        let mut claims = Vec::new();
        for row in rows {
            claims.push(row?);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::IssueBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn make_claim(issue_id: &str, agent_id: &str) -> Claim {
        Claim {
            issue_id: issue_id.into(),
            agent_id: agent_id.into(),
            claimed_at: 100,
            expires_at: Some(400),
            heartbeat_at: 100,
        }
    }

    #[test]
    fn second_claim_on_same_issue_loses_race() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("x").build("iss-cl1", 100)).unwrap();

        assert!(store.try_insert_claim_impl(&make_claim("iss-cl1", "agent-a")).unwrap());
        assert!(!store.try_insert_claim_impl(&make_claim("iss-cl1", "agent-b")).unwrap());

        let claim = store.get_claim_impl("iss-cl1").unwrap().unwrap();
        assert_eq!(claim.agent_id, "agent-a");
    }

    #[test]
    fn expired_claims_are_listed() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("x").build("iss-cl2", 100)).unwrap();
        store.try_insert_claim_impl(&make_claim("iss-cl2", "agent-a")).unwrap();

        assert!(store.list_expired_claims_impl(300).unwrap().is_empty());
        let expired = store.list_expired_claims_impl(500).unwrap();
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn delete_claim_if_held_rejects_wrong_agent() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("x").build("iss-cl3", 100)).unwrap();
        store.try_insert_claim_impl(&make_claim("iss-cl3", "agent-a")).unwrap();

        assert!(!store.delete_claim_if_held_impl("iss-cl3", "agent-b").unwrap());
        assert!(store.delete_claim_if_held_impl("iss-cl3", "agent-a").unwrap());
        assert!(store.get_claim_impl("iss-cl3").unwrap().is_none());
    }
}

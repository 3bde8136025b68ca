//! Issue CRUD operations for [`SqliteStore`].

use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};

use coord_core::{Issue, IssueStatus, IssueUpdate, Metadata};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;
use crate::traits::BlockedIssue;

pub(crate) const ISSUE_COLUMNS: &str = r#"
    id, description, status, project_id, parent_id, priority, labels, metadata,
    created_at, updated_at, resolved_at
"#;

pub(crate) const ISSUE_COLUMNS_PREFIXED: &str = r#"
    issues.id, issues.description, issues.status, issues.project_id, issues.parent_id,
    issues.priority, issues.labels, issues.metadata,
    issues.created_at, issues.updated_at, issues.resolved_at
"#;

pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let status_str: String = row.get("status")?;
    let labels_str: String = row.get("labels")?;
    let metadata_str: String = row.get("metadata")?;

    let labels: BTreeSet<String> = serde_json::from_str(&labels_str).unwrap_or_default();

    Ok(Issue {
        id: row.get("id")?,
        description: row.get("description")?,
        status: status_str.parse().unwrap_or(IssueStatus::Open),
        project_id: row.get("project_id")?,
        parent_id: row.get("parent_id")?,
        priority: row.get("priority")?,
        labels,
        metadata: Metadata::from_json_str(&metadata_str),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        resolved_at: row.get("resolved_at")?,
    })
}

pub(crate) fn insert_issue(conn: &Connection, issue: &Issue) -> Result<()> {
    let labels_str = serde_json::to_string(&issue.labels).unwrap_or_else(|_| "[]".into());

    conn.execute(
        &format!(
            "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            issue.id,
            issue.description,
            issue.status.as_str(),
            issue.project_id,
            issue.parent_id,
            issue.priority,
            labels_str,
            issue.metadata.to_json_string(),
            issue.created_at,
            issue.updated_at,
            issue.resolved_at,
        ],
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn create_issue_impl(&self, issue: &Issue) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_issue(&conn, issue)
    }

    pub fn get_issue_impl(&self, id: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        get_issue_on_conn(&conn, id)
    }

    pub fn update_issue_impl(&self, id: &str, update: &IssueUpdate) -> Result<()> {
        let conn = self.lock_conn()?;
        update_issue_on_conn(&conn, id, update)
    }

    pub fn list_issues_impl(&self) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues ORDER BY created_at ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    pub fn list_issues_by_project_impl(&self, project_id: &str) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE project_id = ?1 ORDER BY created_at ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![project_id], scan_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    /// Issues with status `open` and no unresolved `blocks` dependency.
    pub fn get_ready_issues_impl(&self) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {ISSUE_COLUMNS_PREFIXED} FROM issues
             WHERE issues.status = 'open'
               AND NOT EXISTS (
                   SELECT 1 FROM dependencies d
                   JOIN issues blocker ON blocker.id = d.to_id
                   WHERE d.from_id = issues.id
                     AND d.type = 'blocks'
                     AND blocker.status NOT IN ('done', 'cancelled')
               )
             ORDER BY issues.priority ASC, issues.created_at ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_issue)?;
        let mut issues = Vec::new();
        for row in rows {
            issues.push(row?);
        }
        Ok(issues)
    }

    /// Issues with status `blocked`, annotated with the count of still-open
    /// blocking dependencies.
    pub fn get_blocked_issues_impl(&self) -> Result<Vec<BlockedIssue>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {ISSUE_COLUMNS_PREFIXED},
                    (SELECT COUNT(*) FROM dependencies d
                       JOIN issues blocker ON blocker.id = d.to_id
                      WHERE d.from_id = issues.id
                        AND d.type = 'blocks'
                        AND blocker.status NOT IN ('done', 'cancelled')) AS blocked_by_count
             FROM issues
             WHERE issues.status = 'blocked'
             ORDER BY issues.priority ASC, issues.created_at ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let issue = scan_issue(row)?;
            let blocked_by_count: i32 = row.get("blocked_by_count")?;
            Ok(BlockedIssue { issue, blocked_by_count })
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

pub(crate) fn get_issue_on_conn(conn: &Connection, id: &str) -> Result<Issue> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_issue).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
        other => StorageError::Query(other),
    })
}

pub(crate) fn update_issue_on_conn(conn: &Connection, id: &str, update: &IssueUpdate) -> Result<()> {
    let mut set_clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(ref description) = update.description {
        set_clauses.push("description = ?".into());
        values.push(Box::new(description.clone()));
    }
    if let Some(status) = update.status {
        set_clauses.push("status = ?".into());
        values.push(Box::new(status.as_str().to_string()));
        set_clauses.push("resolved_at = ?".into());
        if status.is_terminal() {
            values.push(Box::new(coord_core::now_unix()));
        } else {
            values.push(Box::new(None::<i64>));
        }
    }
    if let Some(priority) = update.priority {
        set_clauses.push("priority = ?".into());
        values.push(Box::new(priority));
    }
    if let Some(ref labels) = update.labels {
        set_clauses.push("labels = ?".into());
        values.push(Box::new(serde_json::to_string(labels).unwrap_or_else(|_| "[]".into())));
    }
    if let Some(ref metadata) = update.metadata {
        set_clauses.push("metadata = ?".into());
        values.push(Box::new(metadata.to_json_string()));
    }

    if set_clauses.is_empty() {
        return Ok(());
    }

    values.push(Box::new(id.to_string()));
    let sql = format!("UPDATE issues SET {} WHERE id = ?", set_clauses.join(", "));
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();

    let affected = conn.execute(&sql, refs.as_slice())?;
    if affected == 0 {
        return Err(StorageError::not_found("issue", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::IssueBuilder;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn create_and_get_issue() {
        let store = test_store();
        let issue = IssueBuilder::new("Test issue").priority(2).build("iss-1", 100);
        store.create_issue_impl(&issue).unwrap();

        let got = store.get_issue_impl("iss-1").unwrap();
        assert_eq!(got.description, "Test issue");
        assert_eq!(got.priority, 2);
        assert_eq!(got.status, IssueStatus::Open);
    }

    #[test]
    fn get_nonexistent_issue_returns_not_found() {
        let store = test_store();
        let err = store.get_issue_impl("iss-nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_issue_partial() {
        let store = test_store();
        let issue = IssueBuilder::new("Original").build("iss-2", 100);
        store.create_issue_impl(&issue).unwrap();

        let update = IssueUpdate {
            description: Some("Updated".into()),
            priority: Some(3),
            ..Default::default()
        };
        store.update_issue_impl("iss-2", &update).unwrap();

        let got = store.get_issue_impl("iss-2").unwrap();
        assert_eq!(got.description, "Updated");
        assert_eq!(got.priority, 3);
    }

    #[test]
    fn ready_issues_excludes_blocked_by_open_dependency() {
        let store = test_store();
        let blocker = IssueBuilder::new("blocker").build("iss-blocker", 100);
        let blocked = IssueBuilder::new("blocked").build("iss-blocked", 100);
        store.create_issue_impl(&blocker).unwrap();
        store.create_issue_impl(&blocked).unwrap();

        store
            .add_dependency_impl(&coord_core::Dependency::new(
                "iss-blocked",
                "iss-blocker",
                coord_core::DependencyType::Blocks,
                100,
            ))
            .unwrap();

        let ready = store.get_ready_issues_impl().unwrap();
        let ready_ids: Vec<&str> = ready.iter().map(|i| i.id.as_str()).collect();
        assert!(ready_ids.contains(&"iss-blocker"));
        assert!(!ready_ids.contains(&"iss-blocked"));
    }

    #[test]
    fn ready_issues_unblocked_once_blocker_done() {
        let store = test_store();
        let blocker = IssueBuilder::new("blocker").build("iss-bd1", 100);
        let blocked = IssueBuilder::new("blocked").build("iss-bd2", 100);
        store.create_issue_impl(&blocker).unwrap();
        store.create_issue_impl(&blocked).unwrap();
        store
            .add_dependency_impl(&coord_core::Dependency::new(
                "iss-bd2",
                "iss-bd1",
                coord_core::DependencyType::Blocks,
                100,
            ))
            .unwrap();

        store
            .update_issue_impl(
                "iss-bd1",
                &IssueUpdate {
                    status: Some(IssueStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap();

        let ready = store.get_ready_issues_impl().unwrap();
        assert!(ready.iter().any(|i| i.id == "iss-bd2"));
    }
}

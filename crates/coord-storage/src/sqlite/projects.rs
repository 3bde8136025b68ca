//! Project CRUD operations for [`SqliteStore`].

use rusqlite::{params, Connection, Row};

use coord_core::{Metadata, Project, ProjectStatus, ProjectUpdate};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

const PROJECT_COLUMNS: &str = "id, name, description, status, success_criteria, created_at, completed_at, metadata";

fn scan_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    let status_str: String = row.get("status")?;
    let metadata_str: String = row.get("metadata")?;
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: status_str.parse().unwrap_or(ProjectStatus::Active),
        success_criteria: row.get("success_criteria")?,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
        metadata: Metadata::from_json_str(&metadata_str),
    })
}

pub(crate) fn insert_project(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            project.id,
            project.name,
            project.description,
            project.status.as_str(),
            project.success_criteria,
            project.created_at,
            project.completed_at,
            project.metadata.to_json_string(),
        ],
    )?;
    Ok(())
}

impl SqliteStore {
    pub fn create_project_impl(&self, project: &Project) -> Result<()> {
        let conn = self.lock_conn()?;
        insert_project(&conn, project)
    }

    pub fn get_project_impl(&self, id: &str) -> Result<Project> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        conn.query_row(&sql, params![id], scan_project).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("project", id),
            other => StorageError::Query(other),
        })
    }

    pub fn update_project_impl(&self, id: &str, update: &ProjectUpdate) -> Result<()> {
        let conn = self.lock_conn()?;

        let mut set_clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref name) = update.name {
            set_clauses.push("name = ?".into());
            values.push(Box::new(name.clone()));
        }
        if let Some(ref description) = update.description {
            set_clauses.push("description = ?".into());
            values.push(Box::new(description.clone()));
        }
        if let Some(status) = update.status {
            set_clauses.push("status = ?".into());
            values.push(Box::new(status.as_str().to_string()));
            if status == ProjectStatus::Completed {
                set_clauses.push("completed_at = ?".into());
                values.push(Box::new(coord_core::now_unix()));
            }
        }
        if let Some(ref success_criteria) = update.success_criteria {
            set_clauses.push("success_criteria = ?".into());
            values.push(Box::new(success_criteria.clone()));
        }
        if let Some(ref metadata) = update.metadata {
            set_clauses.push("metadata = ?".into());
            values.push(Box::new(metadata.to_json_string()));
        }

        if set_clauses.is_empty() {
            return Ok(());
        }

        let sql = format!("UPDATE projects SET {} WHERE id = ?", set_clauses.join(", "));
        values.push(Box::new(id.to_string()));
        let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let affected = conn.execute(&sql, refs.as_slice())?;
        if affected == 0 {
            return Err(StorageError::not_found("project", id));
        }
        Ok(())
    }

    pub fn list_projects_impl(&self) -> Result<Vec<Project>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], scan_project)?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn make_project(id: &str) -> Project {
        Project {
            id: id.into(),
            name: "Widget launch".into(),
            description: "".into(),
            status: ProjectStatus::Active,
            success_criteria: "".into(),
            created_at: 100,
            completed_at: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn create_and_get_project() {
        let store = test_store();
        store.create_project_impl(&make_project("proj-1")).unwrap();
        let got = store.get_project_impl("proj-1").unwrap();
        assert_eq!(got.name, "Widget launch");
        assert_eq!(got.status, ProjectStatus::Active);
    }

    #[test]
    fn get_nonexistent_project_returns_not_found() {
        let store = test_store();
        let err = store.get_project_impl("proj-nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_project_partial() {
        let store = test_store();
        store.create_project_impl(&make_project("proj-2")).unwrap();

        let update = ProjectUpdate {
            status: Some(ProjectStatus::Paused),
            ..Default::default()
        };
        store.update_project_impl("proj-2", &update).unwrap();

        let got = store.get_project_impl("proj-2").unwrap();
        assert_eq!(got.status, ProjectStatus::Paused);
        assert_eq!(got.name, "Widget launch");
    }

    #[test]
    fn list_projects_orders_by_creation() {
        let store = test_store();
        let mut p1 = make_project("proj-a");
        p1.created_at = 200;
        let mut p2 = make_project("proj-b");
        p2.created_at = 100;
        store.create_project_impl(&p1).unwrap();
        store.create_project_impl(&p2).unwrap();

        let listed = store.list_projects_impl().unwrap();
        assert_eq!(listed[0].id, "proj-b");
        assert_eq!(listed[1].id, "proj-a");
    }
}

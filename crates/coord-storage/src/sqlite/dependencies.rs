//! Dependency CRUD operations and cycle detection for [`SqliteStore`].

use std::collections::{HashSet, VecDeque};

use rusqlite::{params, Connection};

use coord_core::{Dependency, DependencyType};

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

fn scan_dependency(row: &rusqlite::Row<'_>) -> rusqlite::Result<Dependency> {
    let type_str: String = row.get("type")?;
    Ok(Dependency {
        from_id: row.get("from_id")?,
        to_id: row.get("to_id")?,
        dep_type: type_str.parse().unwrap_or(DependencyType::Blocks),
        created_at: row.get("created_at")?,
    })
}

/// BFS from `to_id` over `blocks` edges to see whether `from_id` is already
/// (transitively) a blocker of `to_id`. If so, adding `from_id -> to_id`
/// would close a cycle.
fn detect_cycle(conn: &Connection, from_id: &str, to_id: &str) -> Result<()> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(to_id.to_string());

    while let Some(current) = queue.pop_front() {
        if current == from_id {
            return Err(StorageError::CycleDetected {
                from: from_id.to_string(),
                to: to_id.to_string(),
            });
        }
        if !visited.insert(current.clone()) {
            continue;
        }
        let mut stmt = conn.prepare_cached("SELECT to_id FROM dependencies WHERE from_id = ?1 AND type = 'blocks'")?;
        let rows = stmt.query_map(params![current], |row| row.get::<_, String>(0))?;
        for row in rows {
            let next = row?;
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }

    Ok(())
}

impl SqliteStore {
    pub fn add_dependency_impl(&self, dep: &Dependency) -> Result<()> {
        let conn = self.lock_conn()?;

        if dep.dep_type == DependencyType::Blocks {
            detect_cycle(&conn, &dep.from_id, &dep.to_id)?;
        }

        conn.execute(
            "INSERT OR IGNORE INTO dependencies (from_id, to_id, type, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![dep.from_id, dep.to_id, dep.dep_type.as_str(), dep.created_at],
        )?;
        Ok(())
    }

    pub fn remove_dependency_impl(&self, from_id: &str, to_id: &str, dep_type: DependencyType) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute(
            "DELETE FROM dependencies WHERE from_id = ?1 AND to_id = ?2 AND type = ?3",
            params![from_id, to_id, dep_type.as_str()],
        )?;
        if affected == 0 {
            return Err(StorageError::not_found("dependency", format!("{from_id} -{dep_type}-> {to_id}")));
        }
        Ok(())
    }

    pub fn get_dependencies_impl(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT from_id, to_id, type, created_at FROM dependencies WHERE from_id = ?1",
        )?;
        let rows = stmt.query_map(params![issue_id], scan_dependency)?;
        let mut deps = Vec::new();
        for row in rows {
            deps.push(row?);
        }
        Ok(deps)
    }

    pub fn get_dependents_impl(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT from_id, to_id, type, created_at FROM dependencies WHERE to_id = ?1",
        )?;
        let rows = stmt.query_map(params![issue_id], scan_dependency)?;
        let mut deps = Vec::new();
        for row in rows {
            deps.push(row?);
        }
        Ok(deps)
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
    fn add_and_get_dependency() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("parent").build("iss-p1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("child").build("iss-c1", 100)).unwrap();

        let dep = Dependency::new("iss-c1", "iss-p1", DependencyType::Blocks, 100);
        store.add_dependency_impl(&dep).unwrap();

        let deps = store.get_dependencies_impl("iss-c1").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].to_id, "iss-p1");

        let dependents = store.get_dependents_impl("iss-p1").unwrap();
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].from_id, "iss-c1");
    }

    #[test]
    fn remove_dependency() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("a").build("iss-a1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("b").build("iss-b1", 100)).unwrap();

        let dep = Dependency::new("iss-b1", "iss-a1", DependencyType::Blocks, 100);
        store.add_dependency_impl(&dep).unwrap();
        store.remove_dependency_impl("iss-b1", "iss-a1", DependencyType::Blocks).unwrap();

        assert!(store.get_dependencies_impl("iss-b1").unwrap().is_empty());
    }

    #[test]
    fn readding_existing_edge_is_idempotent_and_keeps_original_created_at() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("a").build("iss-idem1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("b").build("iss-idem2", 100)).unwrap();

        store.add_dependency_impl(&Dependency::new("iss-idem2", "iss-idem1", DependencyType::Blocks, 100)).unwrap();
        store.add_dependency_impl(&Dependency::new("iss-idem2", "iss-idem1", DependencyType::Blocks, 999)).unwrap();

        let deps = store.get_dependencies_impl("iss-idem2").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].created_at, 100);
    }

    #[test]
    fn multiple_edge_types_between_same_pair_coexist() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("a").build("iss-m1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("b").build("iss-m2", 100)).unwrap();

        store.add_dependency_impl(&Dependency::new("iss-m1", "iss-m2", DependencyType::Blocks, 100)).unwrap();
        store.add_dependency_impl(&Dependency::new("iss-m1", "iss-m2", DependencyType::Informs, 100)).unwrap();

        assert_eq!(store.get_dependencies_impl("iss-m1").unwrap().len(), 2);
    }

    #[test]
    fn cycle_detection_rejects_closing_edge() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("a").build("iss-cy1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("b").build("iss-cy2", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("c").build("iss-cy3", 100)).unwrap();

        store.add_dependency_impl(&Dependency::new("iss-cy1", "iss-cy2", DependencyType::Blocks, 100)).unwrap();
        store.add_dependency_impl(&Dependency::new("iss-cy2", "iss-cy3", DependencyType::Blocks, 100)).unwrap();

        let err = store
            .add_dependency_impl(&Dependency::new("iss-cy3", "iss-cy1", DependencyType::Blocks, 100))
            .unwrap_err();
        assert!(matches!(err, StorageError::CycleDetected { .. }));
    }

    #[test]
    fn cycle_detection_only_applies_to_blocks_edges() {
        let store = test_store();
        store.create_issue_impl(&IssueBuilder::new("a").build("iss-nc1", 100)).unwrap();
        store.create_issue_impl(&IssueBuilder::new("b").build("iss-nc2", 100)).unwrap();

        store.add_dependency_impl(&Dependency::new("iss-nc1", "iss-nc2", DependencyType::Informs, 100)).unwrap();
        // Reverse "informs" edge is fine -- only "blocks" is cycle-checked.
        store.add_dependency_impl(&Dependency::new("iss-nc2", "iss-nc1", DependencyType::Informs, 100)).unwrap();
    }
}

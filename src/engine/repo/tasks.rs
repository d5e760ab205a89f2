//! Task Repository: persisted schedule segments.

use crate::engine::error::Result;
use crate::engine::types::{ScopeKey, TaskRecord, TaskSegment};
use rusqlite::{params, Connection};

pub const TASK_SELECT: &str = "SELECT id, project_id, batch_id, image_id, status_id, start_date, due_date, end_date, completed FROM tasks";

pub struct TaskRepo<'a> {
    conn: &'a Connection,
}

impl<'a> TaskRepo<'a> {
    /// Creates a new repository instance borrowing the connection.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stores one segment as a task record; start and due/end are the segment
    /// boundaries.
    ///
    /// # Errors
    /// Returns an error if the insertion fails.
    pub fn add_segment(&self, scope: ScopeKey, segment: &TaskSegment) -> Result<TaskRecord> {
        self.conn.execute(
            "INSERT INTO tasks (project_id, batch_id, image_id, status_id, start_date, due_date, end_date, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, 0)",
            params![
                scope.project_id,
                scope.batch_id,
                scope.image_id,
                segment.status_id,
                segment.start,
                segment.end
            ],
        )?;
        Ok(TaskRecord {
            id: self.conn.last_insert_rowid(),
            scope,
            status_id: segment.status_id,
            start_date: segment.start,
            due_date: segment.end,
            end_date: segment.end,
            completed: false,
        })
    }

    /// Drops every task record of a scope.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn clear(&self, scope: ScopeKey) -> Result<usize> {
        let deleted = self.conn.execute(
            "DELETE FROM tasks WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3",
            params![scope.project_id, scope.batch_id, scope.image_id],
        )?;
        Ok(deleted)
    }

    /// Retrieves the task records of a scope, ordered by start date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list(&self, scope: ScopeKey) -> Result<Vec<TaskRecord>> {
        let sql = format!(
            "{TASK_SELECT} WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3 ORDER BY start_date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![scope.project_id, scope.batch_id, scope.image_id],
            |row| {
                Ok(TaskRecord {
                    id: row.get(0)?,
                    scope: ScopeKey::new(row.get(1)?, row.get(2)?, row.get(3)?),
                    status_id: row.get(4)?,
                    start_date: row.get(5)?,
                    due_date: row.get(6)?,
                    end_date: row.get(7)?,
                    completed: row.get(8)?,
                })
            },
        )?;

        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::Db;

    #[test]
    fn test_segment_round_trip() {
        let conn = Db::open_in_memory().unwrap();
        let repo = TaskRepo::new(&conn);
        let scope = ScopeKey::new(1, 1, 1);
        let segment = TaskSegment {
            status_id: 3,
            start: "2024-01-08".parse().unwrap(),
            end: "2024-01-10".parse().unwrap(),
        };

        let stored = repo.add_segment(scope, &segment).unwrap();
        let listed = repo.list(scope).unwrap();
        assert_eq!(listed, vec![stored]);
        assert_eq!(listed[0].due_date, segment.end);
        assert!(repo.list(ScopeKey::new(1, 1, 2)).unwrap().is_empty());

        assert_eq!(repo.clear(scope).unwrap(), 1);
        assert!(repo.list(scope).unwrap().is_empty());
    }
}

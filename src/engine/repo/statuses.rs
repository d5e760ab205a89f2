//! Status Repository: the catalog of named statuses.

use crate::engine::error::Result;
use crate::engine::types::Status;
use rusqlite::{params, Connection, OptionalExtension};

pub struct StatusRepo<'a> {
    conn: &'a Connection,
}

impl<'a> StatusRepo<'a> {
    /// Creates a new status repository instance.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Adds a status, returning the id of the new or already existing row.
    ///
    /// # Errors
    /// Returns an error if the insertion fails.
    pub fn add(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO statuses (name) VALUES (?1)",
            params![name],
        )?;
        let id = self
            .conn
            .query_row("SELECT id FROM statuses WHERE name = ?1", params![name], |r| r.get(0))?;
        Ok(id)
    }

    /// Resolves a status name to its id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn lookup(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT id FROM statuses WHERE name = ?1", params![name], |r| r.get(0))
            .optional()?)
    }

    /// Lists the catalog ordered by id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<Status>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM statuses ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Status {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut statuses = Vec::new();
        for s in rows {
            statuses.push(s?);
        }
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::Db;

    #[test]
    fn test_add_is_idempotent() {
        let conn = Db::open_in_memory().unwrap();
        let repo = StatusRepo::new(&conn);
        let first = repo.add("Modeling").unwrap();
        let again = repo.add("Modeling").unwrap();
        assert_eq!(first, again);
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_lookup() {
        let conn = Db::open_in_memory().unwrap();
        let repo = StatusRepo::new(&conn);
        assert_eq!(repo.lookup("Delay").unwrap(), None);
        let id = repo.add("Delay").unwrap();
        assert_eq!(repo.lookup("Delay").unwrap(), Some(id));
    }
}

//! Cell Repository: the calendar cells of every scope.

use crate::engine::error::Result;
use crate::engine::types::{CalendarCell, NewCell, ScopeKey};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

const CELL_SELECT: &str =
    "SELECT id, project_id, batch_id, image_id, date, status_id, completed FROM cells";

pub struct CellRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CellRepo<'a> {
    /// Creates a new repository instance borrowing the connection.
    #[must_use]
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Loads the full timeline of a scope, ascending by date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn load_scope(&self, scope: ScopeKey) -> Result<Vec<CalendarCell>> {
        let sql = format!(
            "{CELL_SELECT} WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3 ORDER BY date"
        );
        self.query(&sql, params![scope.project_id, scope.batch_id, scope.image_id])
    }

    /// Loads the cells of a scope inside `[from, to]`, ascending by date.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn load_range(&self, scope: ScopeKey, from: NaiveDate, to: NaiveDate) -> Result<Vec<CalendarCell>> {
        let sql = format!(
            "{CELL_SELECT} WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3
             AND date BETWEEN ?4 AND ?5 ORDER BY date"
        );
        self.query(
            &sql,
            params![scope.project_id, scope.batch_id, scope.image_id, from, to],
        )
    }

    /// Loads the cells stored under the given composite keys.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn find_by_keys(&self, keys: &[(ScopeKey, NaiveDate)]) -> Result<Vec<CalendarCell>> {
        let sql = format!(
            "{CELL_SELECT} WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3 AND date = ?4"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut cells = Vec::new();
        for (scope, date) in keys {
            let rows = stmt.query_map(
                params![scope.project_id, scope.batch_id, scope.image_id, date],
                row_to_cell,
            )?;
            for cell in rows {
                cells.push(cell?);
            }
        }
        Ok(cells)
    }

    /// Inserts rows, or updates status and completion where a cell already
    /// exists for the same scope and date.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub fn upsert_cells(&self, rows: &[NewCell]) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO cells (project_id, batch_id, image_id, date, status_id, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (project_id, batch_id, image_id, date) DO UPDATE SET
                status_id = excluded.status_id,
                completed = excluded.completed,
                updated_at = CURRENT_TIMESTAMP",
        )?;
        let mut written = 0;
        for row in rows {
            written += stmt.execute(params![
                row.scope.project_id,
                row.scope.batch_id,
                row.scope.image_id,
                row.date,
                row.status_id,
                row.completed
            ])?;
        }
        Ok(written)
    }

    /// Inserts rows whose scope and date are still free. Existing cells keep
    /// their status and completion.
    ///
    /// # Errors
    /// Returns an error if any statement fails.
    pub fn insert_missing(&self, rows: &[NewCell]) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO cells (project_id, batch_id, image_id, date, status_id, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (project_id, batch_id, image_id, date) DO NOTHING",
        )?;
        let mut written = 0;
        for row in rows {
            written += stmt.execute(params![
                row.scope.project_id,
                row.scope.batch_id,
                row.scope.image_id,
                row.date,
                row.status_id,
                row.completed
            ])?;
        }
        Ok(written)
    }

    /// Deletes cells by id.
    ///
    /// # Errors
    /// Returns an error if any delete fails.
    pub fn delete_cells(&self, ids: &[i64]) -> Result<usize> {
        let mut stmt = self.conn.prepare("DELETE FROM cells WHERE id = ?1")?;
        let mut deleted = 0;
        for id in ids {
            deleted += stmt.execute(params![id])?;
        }
        Ok(deleted)
    }

    /// Deletes the cells of a scope on the given dates.
    ///
    /// # Errors
    /// Returns an error if any delete fails.
    pub fn delete_dates(&self, scope: ScopeKey, dates: &[NaiveDate]) -> Result<usize> {
        let mut stmt = self.conn.prepare(
            "DELETE FROM cells WHERE project_id = ?1 AND batch_id = ?2 AND image_id = ?3 AND date = ?4",
        )?;
        let mut deleted = 0;
        for date in dates {
            deleted += stmt.execute(params![scope.project_id, scope.batch_id, scope.image_id, date])?;
        }
        Ok(deleted)
    }

    /// Reassigns a cell to another date.
    ///
    /// # Errors
    /// Returns an error if the update fails, including when the target date is
    /// already taken within the scope.
    pub fn move_cell(&self, id: i64, date: NaiveDate) -> Result<()> {
        self.conn.execute(
            "UPDATE cells SET date = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![date, id],
        )?;
        Ok(())
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<CalendarCell>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_cell)?;
        let mut cells = Vec::new();
        for cell in rows {
            cells.push(cell?);
        }
        Ok(cells)
    }
}

/// Converts a row selected with [`CELL_SELECT`] into a cell.
fn row_to_cell(row: &rusqlite::Row) -> rusqlite::Result<CalendarCell> {
    Ok(CalendarCell {
        id: row.get(0)?,
        scope: ScopeKey::new(row.get(1)?, row.get(2)?, row.get(3)?),
        date: row.get(4)?,
        status_id: row.get(5)?,
        completed: row.get(6)?,
    })
}

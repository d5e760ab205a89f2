//! Database bootstrap: location, schema and seed data.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_DIR: &str = ".slipway";
const DB_FILE: &str = "state.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Statuses the engine looks up by name.
pub const DEFAULT_STATUSES: [&str; 2] = ["Delay", "Weekend"];

pub struct Db;

impl Db {
    /// Default database location relative to the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        Path::new(DB_DIR).join(DB_FILE)
    }

    /// Creates the database file, applies the schema and seeds the default
    /// statuses. Safe to run more than once.
    ///
    /// # Errors
    /// Returns error if directory creation, DB opening, or migration fails.
    pub fn init(path: &Path) -> Result<Connection> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let conn = Self::open(path)?;
        Self::migrate(&conn)?;
        Self::seed(&conn)?;
        Ok(conn)
    }

    /// Connects to an existing database.
    ///
    /// # Errors
    /// Returns error if the database file does not exist or cannot be opened.
    pub fn connect(path: &Path) -> Result<Connection> {
        if !path.exists() {
            bail!(
                "No schedule store at {}. Run `slipway init` first.",
                path.display()
            );
        }
        let conn = Self::open(path)?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    /// Opens a migrated, unseeded in-memory database.
    ///
    /// # Errors
    /// Returns error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    fn open(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Applies the schema.
    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS statuses (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL
            )",
            [],
        )
        .context("Failed to create statuses table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cells (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                batch_id INTEGER NOT NULL,
                image_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                status_id INTEGER NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (project_id, batch_id, image_id, date)
            )",
            [],
        )
        .context("Failed to create cells table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL,
                batch_id INTEGER NOT NULL,
                image_id INTEGER NOT NULL,
                status_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                due_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create tasks table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_scope ON tasks (project_id, batch_id, image_id)",
            [],
        )
        .context("Failed to create tasks index")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create settings table")?;

        Ok(())
    }

    fn seed(conn: &Connection) -> Result<()> {
        for name in DEFAULT_STATUSES {
            conn.execute(
                "INSERT OR IGNORE INTO statuses (name) VALUES (?1)",
                params![name],
            )
            .with_context(|| format!("Failed to seed status {name}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        assert!(Db::connect(&path).is_err());

        Db::init(&path).unwrap();
        let conn = Db::connect(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_init_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        Db::init(&path).unwrap();
        Db::init(&path).unwrap();
        let conn = Db::connect(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_in_memory_is_unseeded() {
        let conn = Db::open_in_memory().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM statuses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

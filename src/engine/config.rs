//! Engine configuration, persisted in the `settings` table.

use super::error::{Result, ScheduleError};
use rusqlite::{params, Connection};
use serde::Serialize;

pub const KEY_DELAY_STATUS: &str = "delay_status";
pub const KEY_WEEKEND_STATUS: &str = "weekend_status";
pub const KEY_MAX_SHIFT_DAYS: &str = "max_shift_days";

pub const KEYS: [&str; 3] = [KEY_DELAY_STATUS, KEY_WEEKEND_STATUS, KEY_MAX_SHIFT_DAYS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    /// Catalog name of the status used for delay markers.
    pub delay_status: String,
    /// Catalog name of the status used to paint weekends. Optional in the
    /// catalog: when absent, no cell is treated as a weekend marker.
    pub weekend_status: String,
    /// Scan limit when looking for a free slot for one cell.
    pub max_shift_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delay_status: "Delay".to_string(),
            weekend_status: "Weekend".to_string(),
            max_shift_days: 366,
        }
    }
}

impl EngineConfig {
    /// Loads the defaults overlaid with whatever is stored in `settings`.
    ///
    /// # Errors
    /// Returns `Config` for an unparseable value, `Storage` if the query fails.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut config = Self::default();
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config.apply(&key, &value)?;
        }
        Ok(config)
    }

    /// Validates and stores one setting.
    ///
    /// # Errors
    /// Returns `Config` for an unknown key or invalid value.
    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        Self::default().apply(key, value)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Current value of a setting as text.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_DELAY_STATUS => Some(self.delay_status.clone()),
            KEY_WEEKEND_STATUS => Some(self.weekend_status.clone()),
            KEY_MAX_SHIFT_DAYS => Some(self.max_shift_days.to_string()),
            _ => None,
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || ScheduleError::Config {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            KEY_DELAY_STATUS | KEY_WEEKEND_STATUS if value.trim().is_empty() => return Err(invalid()),
            KEY_DELAY_STATUS => self.delay_status = value.to_string(),
            KEY_WEEKEND_STATUS => self.weekend_status = value.to_string(),
            KEY_MAX_SHIFT_DAYS => {
                self.max_shift_days = value.parse::<u32>().ok().filter(|d| *d > 0).ok_or_else(invalid)?;
            }
            _ => return Err(invalid()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::db::Db;

    #[test]
    fn test_defaults_without_settings() {
        let conn = Db::open_in_memory().unwrap();
        assert_eq!(EngineConfig::load(&conn).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_stored_settings_override_defaults() {
        let conn = Db::open_in_memory().unwrap();
        EngineConfig::set(&conn, KEY_DELAY_STATUS, "Slip").unwrap();
        EngineConfig::set(&conn, KEY_MAX_SHIFT_DAYS, "30").unwrap();
        EngineConfig::set(&conn, KEY_MAX_SHIFT_DAYS, "45").unwrap();

        let config = EngineConfig::load(&conn).unwrap();
        assert_eq!(config.delay_status, "Slip");
        assert_eq!(config.weekend_status, "Weekend");
        assert_eq!(config.max_shift_days, 45);
        assert_eq!(config.get(KEY_MAX_SHIFT_DAYS).as_deref(), Some("45"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let conn = Db::open_in_memory().unwrap();
        assert!(EngineConfig::set(&conn, KEY_MAX_SHIFT_DAYS, "0").is_err());
        assert!(EngineConfig::set(&conn, KEY_MAX_SHIFT_DAYS, "soon").is_err());
        assert!(EngineConfig::set(&conn, KEY_DELAY_STATUS, "  ").is_err());
        assert!(matches!(
            EngineConfig::set(&conn, "colour", "red"),
            Err(ScheduleError::Config { .. })
        ));
    }
}

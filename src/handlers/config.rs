//! Handler for the `config` command.

use anyhow::{bail, Result};
use colored::Colorize;
use slipway::engine::config::{EngineConfig, KEYS};
use slipway::engine::db::Db;
use std::path::Path;

/// Prints one setting, or all of them.
///
/// # Errors
/// Returns error if the key is unknown or the settings cannot be read.
pub fn show(db: &Path, key: Option<&str>) -> Result<()> {
    let conn = Db::connect(db)?;
    let config = EngineConfig::load(&conn)?;

    if let Some(key) = key {
        let Some(value) = config.get(key) else {
            bail!("Unknown setting '{key}'. Known settings: {}", KEYS.join(", "));
        };
        println!("{value}");
        return Ok(());
    }

    for key in KEYS {
        println!("   {} = {}", key.cyan(), config.get(key).unwrap_or_default());
    }
    Ok(())
}

/// Validates and stores a setting.
///
/// # Errors
/// Returns error if the key is unknown or the value invalid.
pub fn set(db: &Path, key: &str, value: &str) -> Result<()> {
    let conn = Db::connect(db)?;
    EngineConfig::set(&conn, key, value)?;
    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

//! Handler for the `status` command.

use anyhow::Result;
use colored::Colorize;
use slipway::engine::db::Db;
use slipway::engine::repo::StatusRepo;
use std::path::Path;

/// Lists the status catalog.
///
/// # Errors
/// Returns error if database query fails.
pub fn list(db: &Path, json: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let statuses = StatusRepo::new(&conn).list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("{} Statuses:", "🎨".cyan());
    for status in statuses {
        println!("   [{}] {}", status.id.to_string().blue(), status.name);
    }
    Ok(())
}

/// Adds a status to the catalog, or reports the existing id.
///
/// # Errors
/// Returns error if the insert fails.
pub fn add(db: &Path, name: &str, json: bool) -> Result<()> {
    let conn = Db::connect(db)?;
    let id = StatusRepo::new(&conn).add(name)?;

    if json {
        println!("{}", serde_json::json!({ "id": id, "name": name }));
    } else {
        println!("{} Status [{}] {}", "✓".green(), id.to_string().blue(), name);
    }
    Ok(())
}

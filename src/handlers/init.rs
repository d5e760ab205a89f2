//! Handler for the `init` command.

use anyhow::Result;
use colored::Colorize;
use slipway::engine::db::Db;
use std::path::Path;

/// Creates the schedule store and seeds the default statuses.
///
/// # Errors
/// Returns error if database initialization fails.
pub fn handle(db: &Path) -> Result<()> {
    Db::init(db)?;
    println!("{} Initialized {}", "✓".green(), db.display());
    Ok(())
}

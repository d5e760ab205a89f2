//! Handler for the `erase` command.

use super::open_scheduler;
use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use slipway::engine::locks::CancelToken;
use slipway::engine::types::ScopeKey;
use std::path::Path;

/// Deletes the scope's cells on the given dates.
///
/// # Errors
/// Returns error if the delete fails.
pub fn handle(db: &Path, scope: ScopeKey, dates: &[NaiveDate]) -> Result<()> {
    let mut scheduler = open_scheduler(db)?;
    let deleted = scheduler.erase(scope, dates, &CancelToken::new())?;
    println!("{} Erased {deleted} cell(s) from {scope}", "✓".green());
    Ok(())
}

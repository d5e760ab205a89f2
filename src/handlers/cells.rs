//! Handler for the `cells` command.

use super::{open_scheduler, print_cells, StatusNames};
use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use slipway::engine::repo::StatusRepo;
use slipway::engine::types::{RangeRequest, ScopeKey};
use std::path::Path;

/// Shows the stored cells of a scope in a date range.
///
/// # Errors
/// Returns error if the range is inverted or the query fails.
pub fn handle(db: &Path, scope: ScopeKey, from: NaiveDate, to: NaiveDate, json: bool) -> Result<()> {
    let scheduler = open_scheduler(db)?;
    let cells = scheduler.cells_in_range(&RangeRequest::new(scope, from, to)?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cells)?);
        return Ok(());
    }

    let names = StatusNames::load(&StatusRepo::new(scheduler.conn()), scheduler.config())?;
    println!("{} {scope}, {from} to {to}", "📅".cyan());
    print_cells(&cells, &names);
    Ok(())
}

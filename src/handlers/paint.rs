//! Handler for the `paint` command.

use super::{open_scheduler, print_cells, resolve_status, StatusNames};
use anyhow::Result;
use chrono::NaiveDate;
use colored::Colorize;
use slipway::engine::locks::CancelToken;
use slipway::engine::repo::StatusRepo;
use slipway::engine::types::{NewCell, ScopeKey};
use std::path::Path;

/// Inserts or recolors the scope's cells on the given dates.
///
/// # Errors
/// Returns error if the status is unknown or the write fails.
pub fn handle(db: &Path, scope: ScopeKey, status: &str, done: bool, dates: &[NaiveDate]) -> Result<()> {
    let mut scheduler = open_scheduler(db)?;
    let status_id = resolve_status(&StatusRepo::new(scheduler.conn()), status)?;

    let rows: Vec<NewCell> = dates
        .iter()
        .map(|&date| NewCell {
            completed: done,
            ..NewCell::pending(scope, date, status_id)
        })
        .collect();
    let painted = scheduler.paint(&rows, &CancelToken::new())?;

    let names = StatusNames::load(&StatusRepo::new(scheduler.conn()), scheduler.config())?;
    println!("{} Painted {} cell(s) for {scope}", "🖌".cyan(), painted.len());
    print_cells(&painted, &names);
    Ok(())
}

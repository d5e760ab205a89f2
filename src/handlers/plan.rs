//! Handler for the `plan` command.

use super::{open_scheduler, StatusNames};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use slipway::engine::locks::CancelToken;
use slipway::engine::repo::StatusRepo;
use slipway::engine::types::{ScheduleRequest, ScopeKey, StatusDuration};
use std::path::Path;

/// Generates the schedule for a scope and prints the stored segments.
///
/// # Errors
/// Returns error if the step list is empty or the write fails.
pub fn handle(
    db: &Path,
    scope: ScopeKey,
    steps: Vec<StatusDuration>,
    anchor: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let mut scheduler = open_scheduler(db)?;
    let req = ScheduleRequest {
        scope,
        durations: steps,
        anchor,
    };
    let today = Local::now().date_naive();
    let records = scheduler.generate_schedule(&req, today, &CancelToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let names = StatusNames::load(&StatusRepo::new(scheduler.conn()), scheduler.config())?;
    println!("{} Planned {scope}", "🗓".cyan());
    if records.is_empty() {
        println!("   (no schedulable steps)");
    }
    for record in &records {
        println!(
            "   {} → {}  {}",
            record.start_date,
            record.end_date,
            names.label(record.status_id)
        );
    }
    Ok(())
}

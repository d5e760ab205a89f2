//! Handler for the `delay` command.

use super::{open_scheduler, print_cells, StatusNames};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use colored::Colorize;
use slipway::engine::locks::CancelToken;
use slipway::engine::repo::StatusRepo;
use slipway::engine::scheduler::DelayReport;
use slipway::engine::types::{RangeRequest, ScopeKey};
use std::path::Path;

/// Reconciles the scope's delay markers against today and shows the range.
///
/// # Errors
/// Returns error if the range is inverted, the delay status is missing, or
/// the reconciliation cannot be applied.
pub fn handle(
    db: &Path,
    scope: ScopeKey,
    from: NaiveDate,
    to: NaiveDate,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let mut scheduler = open_scheduler(db)?;
    let req = RangeRequest::new(scope, from, to)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let report = scheduler.recompute_delays(&req, today, &CancelToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let names = StatusNames::load(&StatusRepo::new(scheduler.conn()), scheduler.config())?;
    print_summary(&report, &names, today);
    print_cells(&report.cells, &names);
    Ok(())
}

fn print_summary(report: &DelayReport, names: &StatusNames, today: NaiveDate) {
    let Some(overdue) = &report.overdue else {
        println!("{} On schedule as of {today}", "✓".green());
        return;
    };

    println!(
        "{} {} was due {} ({} cell(s))",
        "⏰".yellow(),
        names.label(overdue.status_id),
        overdue.end,
        overdue.cells
    );
    let plan = &report.plan;
    if plan.is_noop() {
        println!("   Delay already recorded ({} day(s))", plan.existing_days);
    } else {
        println!(
            "   +{} delay day(s), {} moved, {} cleared",
            plan.inserted(),
            plan.moved(),
            plan.deleted()
        );
    }
}

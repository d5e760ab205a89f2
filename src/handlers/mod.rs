//! Command handlers for the slipway CLI.

pub mod cells;
pub mod config;
pub mod delay;
pub mod erase;
pub mod init;
pub mod paint;
pub mod plan;
pub mod status;

use anyhow::{Context, Result};
use chrono::Datelike;
use colored::{ColoredString, Colorize};
use slipway::engine::config::EngineConfig;
use slipway::engine::db::Db;
use slipway::engine::repo::StatusRepo;
use slipway::engine::scheduler::Scheduler;
use slipway::engine::types::CalendarCell;
use std::collections::HashMap;
use std::path::Path;

/// Opens the store at `db` and wraps it in a scheduler.
fn open_scheduler(db: &Path) -> Result<Scheduler> {
    let conn = Db::connect(db)?;
    Ok(Scheduler::new(conn)?)
}

/// Resolves a status given by name or numeric id.
fn resolve_status(statuses: &StatusRepo<'_>, key: &str) -> Result<i64> {
    if let Ok(id) = key.parse::<i64>() {
        return Ok(id);
    }
    statuses
        .lookup(key)?
        .with_context(|| format!("Unknown status '{key}'. Add it with `slipway status --add`."))
}

/// Lookup table from status id to display name.
struct StatusNames {
    names: HashMap<i64, String>,
    delay: Option<i64>,
    weekend: Option<i64>,
}

impl StatusNames {
    fn load(statuses: &StatusRepo<'_>, config: &EngineConfig) -> Result<Self> {
        let names: HashMap<i64, String> = statuses
            .list()?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        Ok(Self {
            delay: statuses.lookup(&config.delay_status)?,
            weekend: statuses.lookup(&config.weekend_status)?,
            names,
        })
    }

    fn label(&self, status_id: i64) -> ColoredString {
        let name = self
            .names
            .get(&status_id)
            .cloned()
            .unwrap_or_else(|| format!("#{status_id}"));
        if Some(status_id) == self.delay {
            name.red().bold()
        } else if Some(status_id) == self.weekend {
            name.dimmed()
        } else {
            name.normal()
        }
    }
}

fn print_cells(cells: &[CalendarCell], names: &StatusNames) {
    if cells.is_empty() {
        println!("   (no cells in range)");
        return;
    }
    for cell in cells {
        let mark = if cell.completed { "✓".green() } else { "·".dimmed() };
        println!(
            "   {} {} {} {}",
            cell.date,
            cell.date.weekday().to_string().dimmed(),
            mark,
            names.label(cell.status_id)
        );
    }
}

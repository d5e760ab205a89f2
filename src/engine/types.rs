//! Core types for the scheduling engine.
//!
//! Everything here is owned by a single [`ScopeKey`]; nothing is shared
//! between images.

use super::error::{Result, ScheduleError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `(project, batch, image)` triple: the unit a timeline is scheduled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub project_id: i64,
    pub batch_id: i64,
    pub image_id: i64,
}

impl ScopeKey {
    #[must_use]
    pub fn new(project_id: i64, batch_id: i64, image_id: i64) -> Self {
        Self {
            project_id,
            batch_id,
            image_id,
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "project {} / batch {} / image {}",
            self.project_id, self.batch_id, self.image_id
        )
    }
}

/// One date's status assignment within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub id: i64,
    #[serde(flatten)]
    pub scope: ScopeKey,
    pub date: NaiveDate,
    pub status_id: i64,
    pub completed: bool,
}

/// A cell row that has not been stored yet (upsert input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCell {
    #[serde(flatten)]
    pub scope: ScopeKey,
    pub date: NaiveDate,
    pub status_id: i64,
    pub completed: bool,
}

impl NewCell {
    #[must_use]
    pub fn pending(scope: ScopeKey, date: NaiveDate, status_id: i64) -> Self {
        Self {
            scope,
            date,
            status_id,
            completed: false,
        }
    }
}

/// How many business days a status occupies, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDuration {
    pub status_id: i64,
    pub days: i64,
}

impl StatusDuration {
    #[must_use]
    pub fn new(status_id: i64, days: i64) -> Self {
        Self { status_id, days }
    }

    /// Entries with a non-positive status or duration produce nothing.
    #[must_use]
    pub fn is_schedulable(&self) -> bool {
        self.status_id > 0 && self.days > 0
    }
}

/// Parses the `STATUS:DAYS` form used on the command line.
impl FromStr for StatusDuration {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let (status, days) = s.split_once(':').ok_or_else(|| {
            ScheduleError::Validation(format!("expected STATUS:DAYS, got '{s}'"))
        })?;
        let parse = |part: &str| {
            part.trim().parse::<i64>().map_err(|_| {
                ScheduleError::Validation(format!("'{part}' is not a number in '{s}'"))
            })
        };
        Ok(Self::new(parse(status)?, parse(days)?))
    }
}

/// A maximal run of consecutive business days assigned one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSegment {
    pub status_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A persisted segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    #[serde(flatten)]
    pub scope: ScopeKey,
    pub status_id: i64,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub end_date: NaiveDate,
    pub completed: bool,
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
}

/// Inclusive date range. `to` never precedes `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// Returns `Validation` if `to` is before `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(ScheduleError::Validation(format!(
                "range end {to} precedes range start {from}"
            )));
        }
        Ok(Self { from, to })
    }
}

/// Request for initial schedule generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub scope: ScopeKey,
    pub durations: Vec<StatusDuration>,
    pub anchor: Option<NaiveDate>,
}

/// Request for a range fetch, with or without delay recomputation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeRequest {
    pub scope: ScopeKey,
    pub range: DateRange,
}

impl RangeRequest {
    /// # Errors
    /// Returns `Validation` if the range is inverted.
    pub fn new(scope: ScopeKey, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        Ok(Self {
            scope,
            range: DateRange::new(from, to)?,
        })
    }

    /// Re-checks a request whose range was built field by field.
    ///
    /// # Errors
    /// Returns `Validation` if the range is inverted.
    pub fn validate(&self) -> Result<()> {
        DateRange::new(self.range.from, self.range.to).map(|_| ())
    }
}

//! Delay reconciliation.
//!
//! Works on an in-memory snapshot of one scope and produces an ordered list
//! of cell operations. Nothing here touches the store: the scheduler applies
//! the plan inside a single transaction.
//!
//! Given the overdue group ending on `end` and `today`:
//!
//! 1. The delay window is `[end + 1, today]`.
//! 2. Every incomplete cell after `end` that is neither a delay nor a weekend
//!    marker is lifted out and laid back down, in its original order, from the
//!    first business day after the window. Delay markers in the way are
//!    deleted; any other cell pins its slot and pushes the cursor forward.
//! 3. Free business days of the window receive delay markers.
//!
//! Running the plan and then planning again yields an empty plan.

use super::calendar::{business_days_in, day_after, next_business_day};
use super::error::{Result, ScheduleError};
use super::grouping::group_timeline;
use super::overdue::select_overdue;
use super::types::CalendarCell;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Status identifiers and limits the reconciler works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub delay_status: i64,
    pub weekend_status: Option<i64>,
    /// How many calendar days past its starting cursor a single cell may be
    /// pushed before giving up.
    pub max_shift_days: u32,
}

impl DelayPolicy {
    fn is_movable(&self, cell: &CalendarCell) -> bool {
        !cell.completed
            && cell.status_id != self.delay_status
            && Some(cell.status_id) != self.weekend_status
    }
}

/// The inclusive range delay markers are inserted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DelayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DelayWindow {
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One store mutation. Plans list them in an order that never violates the
/// one-cell-per-date invariant when applied one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CellOp {
    Delete { id: i64, date: NaiveDate },
    Move { id: i64, from: NaiveDate, to: NaiveDate },
    Insert { date: NaiveDate, status_id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DelayPlan {
    pub window: Option<DelayWindow>,
    /// Business days in the window.
    pub desired_days: usize,
    /// Delay markers already inside the window.
    pub existing_days: usize,
    pub additional_days: usize,
    pub ops: Vec<CellOp>,
}

impl DelayPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn deleted(&self) -> usize {
        self.count(|op| matches!(op, CellOp::Delete { .. }))
    }

    #[must_use]
    pub fn moved(&self) -> usize {
        self.count(|op| matches!(op, CellOp::Move { .. }))
    }

    #[must_use]
    pub fn inserted(&self) -> usize {
        self.count(|op| matches!(op, CellOp::Insert { .. }))
    }

    fn count(&self, pred: impl Fn(&CellOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

/// Summary of the group that triggered a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverdueSummary {
    pub status_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub cells: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub overdue: Option<OverdueSummary>,
    pub plan: DelayPlan,
}

/// Groups the snapshot, selects the overdue group and plans the delay.
///
/// `cells` is the complete timeline of one scope, ascending by date.
///
/// # Errors
/// Returns `ConflictResolutionExhausted` if a cell cannot be placed within
/// the policy's scan limit.
pub fn reconcile(cells: &[CalendarCell], today: NaiveDate, policy: &DelayPolicy) -> Result<Reconciliation> {
    let groups = group_timeline(cells, policy.weekend_status);
    let Some(group) = select_overdue(&groups, policy.delay_status, today) else {
        debug!(groups = groups.len(), "no overdue group");
        return Ok(Reconciliation::default());
    };

    let overdue = OverdueSummary {
        status_id: group.status_id,
        start: group.start,
        end: group.end,
        cells: group.cells.len(),
    };
    debug!(status = overdue.status_id, start = %overdue.start, end = %overdue.end, "overdue group selected");

    let plan = plan_delay(cells, overdue.end, today, policy)?;
    Ok(Reconciliation {
        overdue: Some(overdue),
        plan,
    })
}

/// Plans the delay for an overdue group ending on `overdue_end`.
///
/// Returns an empty plan when `overdue_end >= today`.
///
/// # Errors
/// Returns `ConflictResolutionExhausted` if a cell cannot be placed within
/// the policy's scan limit.
pub fn plan_delay(
    cells: &[CalendarCell],
    overdue_end: NaiveDate,
    today: NaiveDate,
    policy: &DelayPolicy,
) -> Result<DelayPlan> {
    let start = day_after(overdue_end);
    if start > today {
        return Ok(DelayPlan::default());
    }
    let window = DelayWindow { start, end: today };
    let window_days = business_days_in(window.start, window.end);

    let existing_days = cells
        .iter()
        .filter(|c| c.status_id == policy.delay_status && window.contains(c.date))
        .count();
    let desired_days = window_days.len();

    let mut slots: BTreeMap<NaiveDate, &CalendarCell> = cells.iter().map(|c| (c.date, c)).collect();
    let mut movables: Vec<&CalendarCell> = cells
        .iter()
        .filter(|c| c.date > overdue_end && policy.is_movable(c))
        .collect();
    movables.sort_by_key(|c| c.date);
    for cell in &movables {
        slots.remove(&cell.date);
    }

    let mut deletes = Vec::new();
    let mut backward = Vec::new();
    let mut forward = Vec::new();
    let mut cursor = next_business_day(day_after(window.end));

    for cell in movables {
        let target = claim_slot(&mut slots, cursor, cell, policy, &mut deletes)?;
        slots.insert(target, cell);
        let op = CellOp::Move {
            id: cell.id,
            from: cell.date,
            to: target,
        };
        if target < cell.date {
            backward.push(op);
        } else if target > cell.date {
            forward.push(op);
        }
        cursor = day_after(target);
    }

    let inserts = window_days
        .into_iter()
        .filter(|day| !slots.contains_key(day))
        .map(|date| CellOp::Insert {
            date,
            status_id: policy.delay_status,
        });

    // Placement is monotone, so a backward move only ever lands on a slot
    // vacated by an earlier backward move, and a forward move on a slot
    // vacated by a later forward move.
    let mut ops = deletes;
    ops.extend(backward);
    ops.extend(forward.into_iter().rev());
    ops.extend(inserts);

    Ok(DelayPlan {
        window: Some(window),
        desired_days,
        existing_days,
        additional_days: desired_days.saturating_sub(existing_days),
        ops,
    })
}

/// Finds the first free business day at or after `cursor` for `cell`,
/// deleting a delay marker if one holds it.
fn claim_slot(
    slots: &mut BTreeMap<NaiveDate, &CalendarCell>,
    cursor: NaiveDate,
    cell: &CalendarCell,
    policy: &DelayPolicy,
    deletes: &mut Vec<CellOp>,
) -> Result<NaiveDate> {
    let origin = next_business_day(cursor);
    let mut target = origin;
    loop {
        target = next_business_day(target);
        if (target - origin).num_days() > i64::from(policy.max_shift_days) {
            return Err(ScheduleError::ConflictResolutionExhausted {
                cell_id: cell.id,
                from: origin,
                max_days: policy.max_shift_days,
            });
        }

        match slots.get(&target).copied() {
            None => return Ok(target),
            Some(occupant) if occupant.status_id == policy.delay_status => {
                deletes.push(CellOp::Delete {
                    id: occupant.id,
                    date: target,
                });
                slots.remove(&target);
                return Ok(target);
            }
            Some(_) => target = day_after(target),
        }
    }
}

//! Scheduler: the caller-facing operations.
//!
//! Every mutating operation runs under the scope lock and inside one
//! `IMMEDIATE` transaction. It either commits as a whole or leaves the store
//! exactly as it found it.

use super::calendar::business_days_in;
use super::config::EngineConfig;
use super::error::{Result, ScheduleError};
use super::locks::{CancelToken, ScopeLocks};
use super::reconcile::{reconcile, CellOp, DelayPlan, DelayPolicy, OverdueSummary};
use super::repo::{CellRepo, StatusRepo, TaskRepo};
use super::segments;
use super::types::{CalendarCell, NewCell, RangeRequest, ScheduleRequest, ScopeKey, TaskRecord};
use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Result of a delay recomputation.
#[derive(Debug, Clone, Serialize)]
pub struct DelayReport {
    pub overdue: Option<OverdueSummary>,
    pub plan: DelayPlan,
    /// Cells inside the requested range after reconciliation.
    pub cells: Vec<CalendarCell>,
}

pub struct Scheduler {
    conn: Connection,
    config: EngineConfig,
    locks: ScopeLocks,
}

impl Scheduler {
    /// Wraps a migrated connection, loading the stored configuration.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be read or parsed.
    pub fn new(conn: Connection) -> Result<Self> {
        let config = EngineConfig::load(&conn)?;
        Ok(Self {
            conn,
            config,
            locks: ScopeLocks::new(),
        })
    }

    /// Shares a lock registry with other schedulers in the process.
    #[must_use]
    pub fn with_locks(mut self, locks: ScopeLocks) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` with exclusive access to `scope`.
    ///
    /// # Errors
    /// Propagates `f`'s error after rolling back; returns `Cancelled` if the
    /// token fires before commit.
    pub fn with_scope_lock<T>(
        &mut self,
        scope: ScopeKey,
        cancel: &CancelToken,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        self.with_scopes_lock(&[scope], cancel, f)
    }

    /// Runs `f` with exclusive access to every scope in `scopes`.
    ///
    /// # Errors
    /// Same as [`with_scope_lock`](Self::with_scope_lock).
    pub fn with_scopes_lock<T>(
        &mut self,
        scopes: &[ScopeKey],
        cancel: &CancelToken,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let conn = &mut self.conn;
        self.locks.with_scopes(scopes, || {
            cancel.check()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            cancel.check()?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Lays out the status durations from the anchor (or `today`), replaces
    /// the scope's task records with one per segment and fills the segment
    /// days that have no cell yet. Cells already on the calendar keep their
    /// status and completion.
    ///
    /// # Errors
    /// Returns `Validation` for an empty duration list and `InvalidArgument`
    /// for a duration the calendar cannot hold; storage errors roll the whole
    /// generation back.
    pub fn generate_schedule(
        &mut self,
        req: &ScheduleRequest,
        today: NaiveDate,
        cancel: &CancelToken,
    ) -> Result<Vec<TaskRecord>> {
        if req.durations.is_empty() {
            return Err(ScheduleError::Validation("duration list is empty".into()));
        }
        let anchor = req.anchor.unwrap_or(today);
        let segments = segments::generate(&req.durations, anchor)?;
        let scope = req.scope;

        let records = self.with_scope_lock(scope, cancel, |tx| {
            let tasks = TaskRepo::new(tx);
            let cells = CellRepo::new(tx);
            let replaced = tasks.clear(scope)?;
            if replaced > 0 {
                debug!(%scope, replaced, "previous task records replaced");
            }
            let mut records = Vec::with_capacity(segments.len());
            for segment in &segments {
                cancel.check()?;
                records.push(tasks.add_segment(scope, segment)?);
                let rows: Vec<NewCell> = business_days_in(segment.start, segment.end)
                    .into_iter()
                    .map(|date| NewCell::pending(scope, date, segment.status_id))
                    .collect();
                cells.insert_missing(&rows)?;
            }
            Ok(records)
        })?;

        info!(%scope, %anchor, segments = records.len(), "schedule generated");
        Ok(records)
    }

    /// Re-derives the timeline of the scope, applies the delay plan and
    /// returns the cells inside the requested range.
    ///
    /// # Errors
    /// `Validation` for an inverted range and `StatusNotFound` when the delay
    /// status is missing, both before any write. Planning and storage errors
    /// roll the transaction back.
    pub fn recompute_delays(
        &mut self,
        req: &RangeRequest,
        today: NaiveDate,
        cancel: &CancelToken,
    ) -> Result<DelayReport> {
        req.validate()?;
        let policy = self.policy()?;
        let scope = req.scope;

        let report = self.with_scope_lock(scope, cancel, |tx| {
            let cells = CellRepo::new(tx);
            cancel.check()?;
            let snapshot = cells.load_scope(scope)?;

            let rec = reconcile(&snapshot, today, &policy).inspect_err(|e| {
                warn!(%scope, error = %e, "delay planning failed");
            })?;
            if rec.plan.is_noop() {
                debug!(%scope, overdue = rec.overdue.is_some(), "timeline already consistent");
            } else {
                apply_plan(&cells, scope, &rec.plan, cancel)?;
                info!(
                    %scope,
                    moved = rec.plan.moved(),
                    inserted = rec.plan.inserted(),
                    deleted = rec.plan.deleted(),
                    additional_days = rec.plan.additional_days,
                    "delay applied"
                );
            }

            cancel.check()?;
            let in_range = cells.load_range(scope, req.range.from, req.range.to)?;
            Ok(DelayReport {
                overdue: rec.overdue,
                plan: rec.plan,
                cells: in_range,
            })
        })?;

        Ok(report)
    }

    /// Cells of the scope inside the requested range, without reconciliation.
    ///
    /// # Errors
    /// `Validation` for an inverted range, or a storage error.
    pub fn cells_in_range(&self, req: &RangeRequest) -> Result<Vec<CalendarCell>> {
        req.validate()?;
        CellRepo::new(&self.conn).load_range(req.scope, req.range.from, req.range.to)
    }

    /// Bulk insert-or-update by `(scope, date)`; returns the stored rows.
    ///
    /// # Errors
    /// `Validation` for an empty request; storage errors roll back.
    pub fn paint(&mut self, rows: &[NewCell], cancel: &CancelToken) -> Result<Vec<CalendarCell>> {
        if rows.is_empty() {
            return Err(ScheduleError::Validation("nothing to paint".into()));
        }
        let scopes: Vec<ScopeKey> = rows
            .iter()
            .map(|r| r.scope)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let keys: Vec<(ScopeKey, NaiveDate)> = rows.iter().map(|r| (r.scope, r.date)).collect();

        let painted = self.with_scopes_lock(&scopes, cancel, |tx| {
            let cells = CellRepo::new(tx);
            cells.upsert_cells(rows)?;
            cells.find_by_keys(&keys)
        })?;

        debug!(rows = painted.len(), scopes = scopes.len(), "cells painted");
        Ok(painted)
    }

    /// Bulk delete of a scope's cells on the given dates.
    ///
    /// # Errors
    /// `Validation` for an empty request; storage errors roll back.
    pub fn erase(&mut self, scope: ScopeKey, dates: &[NaiveDate], cancel: &CancelToken) -> Result<usize> {
        if dates.is_empty() {
            return Err(ScheduleError::Validation("no dates to erase".into()));
        }
        let deleted = self.with_scope_lock(scope, cancel, |tx| CellRepo::new(tx).delete_dates(scope, dates))?;
        debug!(%scope, deleted, "cells erased");
        Ok(deleted)
    }

    /// Resolves the configured status names against the catalog.
    ///
    /// # Errors
    /// `StatusNotFound` if the delay status is not in the catalog.
    pub fn policy(&self) -> Result<DelayPolicy> {
        let statuses = StatusRepo::new(&self.conn);
        let delay_status = statuses
            .lookup(&self.config.delay_status)?
            .ok_or_else(|| ScheduleError::StatusNotFound(self.config.delay_status.clone()))?;
        let weekend_status = statuses.lookup(&self.config.weekend_status)?;
        Ok(DelayPolicy {
            delay_status,
            weekend_status,
            max_shift_days: self.config.max_shift_days,
        })
    }
}

/// Applies a plan in order. New delay markers go in as one upsert at the end.
fn apply_plan(cells: &CellRepo<'_>, scope: ScopeKey, plan: &DelayPlan, cancel: &CancelToken) -> Result<()> {
    let mut inserts = Vec::new();
    for op in &plan.ops {
        cancel.check()?;
        match *op {
            CellOp::Delete { id, .. } => {
                cells.delete_cells(&[id])?;
            }
            CellOp::Move { id, to, .. } => cells.move_cell(id, to)?,
            CellOp::Insert { date, status_id } => inserts.push(NewCell::pending(scope, date, status_id)),
        }
    }
    if !inserts.is_empty() {
        cancel.check()?;
        cells.upsert_cells(&inserts)?;
    }
    Ok(())
}

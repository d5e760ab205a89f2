//! Timeline grouping: folds a scope's cells into weekend-bridged status runs.

use super::calendar::{day_after, next_business_day};
use super::types::CalendarCell;
use chrono::NaiveDate;

/// A maximal run of same-status cells. Consecutive members are either
/// calendar-adjacent or separated only by a weekend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineGroup<'a> {
    pub status_id: i64,
    pub cells: Vec<&'a CalendarCell>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// True iff every member cell is completed.
    pub completed: bool,
}

impl<'a> TimelineGroup<'a> {
    fn open(cell: &'a CalendarCell) -> Self {
        Self {
            status_id: cell.status_id,
            cells: vec![cell],
            start: cell.date,
            end: cell.date,
            completed: cell.completed,
        }
    }

    fn push(&mut self, cell: &'a CalendarCell) {
        self.end = cell.date;
        self.completed &= cell.completed;
        self.cells.push(cell);
    }
}

/// Groups `cells`, which must be sorted ascending by date.
///
/// Cells carrying `weekend_status` are invisible: they neither start, extend
/// nor break a group.
#[must_use]
pub fn group_timeline(cells: &[CalendarCell], weekend_status: Option<i64>) -> Vec<TimelineGroup<'_>> {
    let mut groups = Vec::new();
    let mut current: Option<TimelineGroup<'_>> = None;

    for cell in cells
        .iter()
        .filter(|c| Some(c.status_id) != weekend_status)
    {
        match current.as_mut() {
            Some(group)
                if group.status_id == cell.status_id
                    && cell.date == next_business_day(day_after(group.end)) =>
            {
                group.push(cell);
            }
            _ => {
                if let Some(done) = current.replace(TimelineGroup::open(cell)) {
                    groups.push(done);
                }
            }
        }
    }

    groups.extend(current);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ScopeKey;

    const WEEKEND: i64 = 99;

    fn cell(id: i64, date: &str, status_id: i64, completed: bool) -> CalendarCell {
        CalendarCell {
            id,
            scope: ScopeKey::new(1, 1, 1),
            date: date.parse().unwrap(),
            status_id,
            completed,
        }
    }

    fn spans(groups: &[TimelineGroup<'_>]) -> Vec<(i64, String, String, bool)> {
        groups
            .iter()
            .map(|g| (g.status_id, g.start.to_string(), g.end.to_string(), g.completed))
            .collect()
    }

    #[test]
    fn test_group_bridges_weekend() {
        let cells = vec![
            cell(1, "2024-01-04", 1, true),
            cell(2, "2024-01-05", 1, true),
            cell(3, "2024-01-08", 1, false),
        ];
        let groups = group_timeline(&cells, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].cells.len(), 3);
        assert!(!groups[0].completed);
    }

    #[test]
    fn test_weekend_cells_are_invisible() {
        let cells = vec![
            cell(1, "2024-01-05", 1, true),
            cell(2, "2024-01-06", WEEKEND, false),
            cell(3, "2024-01-07", WEEKEND, false),
            cell(4, "2024-01-08", 1, true),
        ];
        let groups = group_timeline(&cells, Some(WEEKEND));
        assert_eq!(
            spans(&groups),
            vec![(1, "2024-01-05".into(), "2024-01-08".into(), true)]
        );
    }

    #[test]
    fn test_weekend_status_groups_when_not_configured() {
        let cells = vec![
            cell(1, "2024-01-05", 1, true),
            cell(2, "2024-01-06", WEEKEND, false),
            cell(3, "2024-01-08", 1, true),
        ];
        let groups = group_timeline(&cells, None);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_status_change_and_gap_break_groups() {
        let cells = vec![
            cell(1, "2024-01-01", 1, true),
            cell(2, "2024-01-02", 2, false),
            cell(3, "2024-01-03", 2, false),
            // 2024-01-04 missing: gap
            cell(4, "2024-01-05", 2, true),
        ];
        let groups = group_timeline(&cells, None);
        assert_eq!(
            spans(&groups),
            vec![
                (1, "2024-01-01".into(), "2024-01-01".into(), true),
                (2, "2024-01-02".into(), "2024-01-03".into(), false),
                (2, "2024-01-05".into(), "2024-01-05".into(), true),
            ]
        );
    }

    #[test]
    fn test_every_visible_cell_in_exactly_one_group() {
        let statuses = [1, 1, 2, WEEKEND, WEEKEND, 2, 3, 3, 1, 1, WEEKEND, 1];
        let start: NaiveDate = "2024-01-03".parse().unwrap();
        let cells: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, &s)| CalendarCell {
                id: i as i64,
                scope: ScopeKey::new(1, 1, 1),
                date: start + chrono::Days::new(i as u64),
                status_id: s,
                completed: i % 3 == 0,
            })
            .collect();

        let groups = group_timeline(&cells, Some(WEEKEND));
        let mut seen: Vec<i64> = groups.iter().flat_map(|g| g.cells.iter().map(|c| c.id)).collect();
        seen.sort_unstable();
        let expected: Vec<i64> = cells
            .iter()
            .filter(|c| c.status_id != WEEKEND)
            .map(|c| c.id)
            .collect();
        assert_eq!(seen, expected);

        for g in &groups {
            assert!(g.cells.iter().all(|c| c.status_id == g.status_id));
            assert_eq!(g.completed, g.cells.iter().all(|c| c.completed));
            for pair in g.cells.windows(2) {
                assert_eq!(pair[1].date, next_business_day(day_after(pair[0].date)));
            }
        }
    }

    #[test]
    fn test_empty_timeline() {
        assert!(group_timeline(&[], Some(WEEKEND)).is_empty());
    }
}

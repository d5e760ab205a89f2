//! Overdue selection: which group, if any, has genuinely slipped.

use super::grouping::TimelineGroup;
use chrono::NaiveDate;

/// Picks the earliest group that is overdue and still blocking.
///
/// A group qualifies when it is not a delay run, is not fully completed,
/// ended before `today`, and no later group is fully completed. Work that was
/// finished out of order means the stalled group no longer blocks anything.
#[must_use]
pub fn select_overdue<'g, 'a>(
    groups: &'g [TimelineGroup<'a>],
    delay_status: i64,
    today: NaiveDate,
) -> Option<&'g TimelineGroup<'a>> {
    // Candidates must sit after the last fully completed group.
    let last_completed = groups.iter().rposition(|g| g.completed);

    groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.status_id != delay_status)
        .filter(|(_, g)| !g.completed)
        .filter(|(_, g)| g.end < today)
        .find(|(i, _)| last_completed.map_or(true, |done| done < *i))
        .map(|(_, g)| g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grouping::group_timeline;
    use crate::engine::types::{CalendarCell, ScopeKey};

    const DELAY: i64 = 50;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn run(cells: &mut Vec<CalendarCell>, status_id: i64, from: &str, to: &str, completed: bool) {
        for day in crate::engine::calendar::business_days_in(d(from), d(to)) {
            cells.push(CalendarCell {
                id: cells.len() as i64 + 1,
                scope: ScopeKey::new(1, 1, 1),
                date: day,
                status_id,
                completed,
            });
        }
    }

    #[test]
    fn test_completed_work_ahead_suppresses_delay() {
        // A done, B stalled 5 days ago, C done and started 3 days ago.
        let mut cells = Vec::new();
        run(&mut cells, 1, "2024-01-01", "2024-01-03", true);
        run(&mut cells, 2, "2024-01-04", "2024-01-10", false);
        run(&mut cells, 3, "2024-01-12", "2024-01-15", true);
        let groups = group_timeline(&cells, None);

        assert!(select_overdue(&groups, DELAY, d("2024-01-15")).is_none());
    }

    #[test]
    fn test_stalled_group_without_later_completion_is_overdue() {
        let mut cells = Vec::new();
        run(&mut cells, 1, "2024-01-01", "2024-01-03", true);
        run(&mut cells, 2, "2024-01-04", "2024-01-10", false);
        let groups = group_timeline(&cells, None);

        let overdue = select_overdue(&groups, DELAY, d("2024-01-15")).unwrap();
        assert_eq!(overdue.status_id, 2);
        assert_eq!(overdue.end, d("2024-01-10"));
    }

    #[test]
    fn test_group_ending_today_is_not_due() {
        let mut cells = Vec::new();
        run(&mut cells, 2, "2024-01-08", "2024-01-10", false);
        let groups = group_timeline(&cells, None);

        assert!(select_overdue(&groups, DELAY, d("2024-01-10")).is_none());
        assert!(select_overdue(&groups, DELAY, d("2024-01-11")).is_some());
    }

    #[test]
    fn test_delay_groups_are_never_overdue() {
        let mut cells = Vec::new();
        run(&mut cells, DELAY, "2024-01-01", "2024-01-05", false);
        run(&mut cells, 2, "2024-01-08", "2024-01-09", false);
        let groups = group_timeline(&cells, None);

        let overdue = select_overdue(&groups, DELAY, d("2024-01-15")).unwrap();
        assert_eq!(overdue.status_id, 2);
    }

    #[test]
    fn test_earliest_eligible_group_wins() {
        let mut cells = Vec::new();
        run(&mut cells, 1, "2024-01-01", "2024-01-02", true);
        run(&mut cells, 2, "2024-01-03", "2024-01-04", false);
        run(&mut cells, 3, "2024-01-05", "2024-01-08", false);
        let groups = group_timeline(&cells, None);

        let overdue = select_overdue(&groups, DELAY, d("2024-01-15")).unwrap();
        assert_eq!(overdue.status_id, 2);
    }

    #[test]
    fn test_partially_completed_later_group_does_not_suppress() {
        let mut cells = Vec::new();
        run(&mut cells, 2, "2024-01-01", "2024-01-03", false);
        run(&mut cells, 3, "2024-01-04", "2024-01-04", true);
        run(&mut cells, 3, "2024-01-05", "2024-01-05", false);
        let groups = group_timeline(&cells, None);
        assert_eq!(groups.len(), 2);
        assert!(!groups[1].completed);

        let overdue = select_overdue(&groups, DELAY, d("2024-01-15")).unwrap();
        assert_eq!(overdue.status_id, 2);
    }

    #[test]
    fn test_never_selects_group_with_completed_successor() {
        let patterns: [&[bool]; 4] = [
            &[false, true, false],
            &[false, false, true],
            &[true, false, true, false],
            &[false, true, true, false],
        ];
        for pattern in patterns {
            let mut cells = Vec::new();
            let start = d("2024-01-01");
            for (i, &done) in pattern.iter().enumerate() {
                let day = start + chrono::Days::new(i as u64);
                run(&mut cells, i as i64 + 1, &day.to_string(), &day.to_string(), done);
            }
            let groups = group_timeline(&cells, None);
            if let Some(g) = select_overdue(&groups, DELAY, d("2024-02-01")) {
                let idx = groups.iter().position(|x| x.start == g.start).unwrap();
                assert!(groups[idx + 1..].iter().all(|later| !later.completed));
            }
        }
    }
}

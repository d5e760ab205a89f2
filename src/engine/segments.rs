//! Segment generation: status durations → weekend-free calendar segments.

use super::calendar::{add_business_days, day_after, following_business_day};
use super::error::Result;
use super::types::{StatusDuration, TaskSegment};
use chrono::NaiveDate;

/// Lays the durations out back to back from `anchor`.
///
/// Each status starts on the business day after the previous one ends.
/// Entries with a non-positive status or duration are skipped and leave the
/// cursor where it is. A status whose business days cross a weekend yields
/// one segment per side of the weekend.
///
/// # Errors
/// Returns `InvalidArgument` when a duration exceeds the enumeration limit or
/// the schedule runs past the end of the calendar.
pub fn generate(durations: &[StatusDuration], anchor: NaiveDate) -> Result<Vec<TaskSegment>> {
    let mut cursor = anchor;
    let mut segments = Vec::new();

    for item in durations.iter().filter(|sd| sd.is_schedulable()) {
        let days = add_business_days(cursor, item.days)?;

        segments.extend(fold_runs(&days).into_iter().map(|(start, end)| TaskSegment {
            status_id: item.status_id,
            start,
            end,
        }));

        if let Some(last) = days.last() {
            cursor = following_business_day(*last)?;
        }
    }

    Ok(segments)
}

/// Splits an ascending date list into maximal runs of consecutive calendar days.
#[must_use]
pub fn fold_runs(days: &[NaiveDate]) -> Vec<(NaiveDate, NaiveDate)> {
    let Some((&first, rest)) = days.split_first() else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let (mut start, mut end) = (first, first);
    for &day in rest {
        if day == day_after(end) {
            end = day;
        } else {
            runs.push((start, end));
            start = day;
            end = day;
        }
    }
    runs.push((start, end));
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calendar::{business_days_in, is_weekend};
    use crate::engine::error::ScheduleError;
    use std::collections::BTreeSet;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn seg(status_id: i64, start: &str, end: &str) -> TaskSegment {
        TaskSegment {
            status_id,
            start: d(start),
            end: d(end),
        }
    }

    #[test]
    fn test_back_to_back_statuses_from_monday() {
        let durations = [StatusDuration::new(1, 3), StatusDuration::new(2, 2)];
        let segments = generate(&durations, d("2024-01-01")).unwrap();
        assert_eq!(
            segments,
            vec![seg(1, "2024-01-01", "2024-01-03"), seg(2, "2024-01-04", "2024-01-05")]
        );
    }

    #[test]
    fn test_saturday_anchor_starts_monday() {
        let segments = generate(&[StatusDuration::new(1, 2)], d("2024-01-06")).unwrap();
        assert_eq!(segments, vec![seg(1, "2024-01-08", "2024-01-09")]);
    }

    #[test]
    fn test_duration_across_weekend_splits_segment() {
        let segments = generate(&[StatusDuration::new(5, 4)], d("2024-01-04")).unwrap();
        assert_eq!(
            segments,
            vec![seg(5, "2024-01-04", "2024-01-05"), seg(5, "2024-01-08", "2024-01-09")]
        );
    }

    #[test]
    fn test_invalid_entries_do_not_move_cursor() {
        let durations = [
            StatusDuration::new(0, 3),
            StatusDuration::new(1, 1),
            StatusDuration::new(2, 0),
            StatusDuration::new(3, -2),
            StatusDuration::new(4, 1),
        ];
        let segments = generate(&durations, d("2024-01-01")).unwrap();
        assert_eq!(
            segments,
            vec![seg(1, "2024-01-01", "2024-01-01"), seg(4, "2024-01-02", "2024-01-02")]
        );
    }

    #[test]
    fn test_oversized_duration_is_rejected() {
        let err = generate(&[StatusDuration::new(1, 100_000_000)], d("2024-01-01")).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(generate(&[], d("2024-01-01")).unwrap().is_empty());
        assert!(fold_runs(&[]).is_empty());
    }

    #[test]
    fn test_coverage_matches_total_duration() {
        let lengths = [1, 2, 3, 5, 7, 11];
        for offset in 0..7 {
            let anchor = d("2024-01-01") + chrono::Days::new(offset);
            let durations: Vec<_> = lengths
                .iter()
                .enumerate()
                .map(|(i, &days)| StatusDuration::new(i as i64 + 1, days))
                .collect();
            let segments = generate(&durations, anchor).unwrap();

            let mut covered = BTreeSet::new();
            let mut total = 0;
            for s in &segments {
                for day in business_days_in(s.start, s.end) {
                    assert!(covered.insert(day), "overlap on {day}");
                    total += 1;
                }
                assert!(!is_weekend(s.start) && !is_weekend(s.end));
            }
            assert_eq!(total, lengths.iter().sum::<i64>());

            for pair in segments.windows(2) {
                assert!(pair[0].end < pair[1].start);
            }
        }
    }
}

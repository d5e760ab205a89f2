//! Business calendar: pure date arithmetic over Monday–Friday working weeks.

use super::error::{Result, ScheduleError};
use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The following calendar day.
#[must_use]
pub fn day_after(date: NaiveDate) -> NaiveDate {
    date + Days::new(1)
}

/// Moves forward until a business day. Business days are returned unchanged.
#[must_use]
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut cursor = date;
    while is_weekend(cursor) {
        cursor = day_after(cursor);
    }
    cursor
}

/// Longest run `add_business_days` will enumerate: ten years of working days.
pub const MAX_BUSINESS_DAYS: i64 = 2_610;

/// The first business day strictly after `date`.
///
/// # Errors
/// Returns `InvalidArgument` when the calendar ends first.
pub fn following_business_day(date: NaiveDate) -> Result<NaiveDate> {
    let mut cursor = checked_day_after(date)?;
    while is_weekend(cursor) {
        cursor = checked_day_after(cursor)?;
    }
    Ok(cursor)
}

fn checked_day_after(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| ScheduleError::InvalidArgument(format!("no calendar day after {date}")))
}

/// Enumerates `n` consecutive business days starting at `seed`, or at the
/// next business day when `seed` falls on a weekend.
///
/// # Errors
/// Returns `InvalidArgument` when `n <= 0`, when `n` exceeds
/// [`MAX_BUSINESS_DAYS`], or when the run would pass the end of the calendar.
pub fn add_business_days(seed: NaiveDate, n: i64) -> Result<Vec<NaiveDate>> {
    if n <= 0 {
        return Err(ScheduleError::InvalidArgument(format!(
            "business day count must be positive, got {n}"
        )));
    }
    if n > MAX_BUSINESS_DAYS {
        return Err(ScheduleError::InvalidArgument(format!(
            "business day count {n} exceeds the limit of {MAX_BUSINESS_DAYS}"
        )));
    }

    let count = usize::try_from(n)
        .map_err(|_| ScheduleError::InvalidArgument(format!("business day count {n} is too large")))?;
    let mut days = Vec::with_capacity(count);
    let mut current = if is_weekend(seed) {
        following_business_day(seed)?
    } else {
        seed
    };
    days.push(current);
    while days.len() < count {
        current = following_business_day(current)?;
        days.push(current);
    }
    Ok(days)
}

/// Business days of the inclusive window `[from, to]`. Empty when `from > to`.
#[must_use]
pub fn business_days_in(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !is_weekend(*d))
        .collect()
}

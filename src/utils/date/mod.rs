// Date utility functions
// Wall-clock helpers shared by the layout engine and the view ranges

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike,
};
use chrono_tz::Tz;

/// Calculate the start of the week containing the given date.
///
/// # Arguments
/// * `date` - The date to find the week start for
/// * `first_day_of_week` - 0 = Sunday, 1 = Monday, etc.
pub fn week_start(date: NaiveDate, first_day_of_week: u8) -> NaiveDate {
    let weekday = date.weekday().num_days_from_sunday() as i64;
    let offset = (weekday - first_day_of_week as i64 + 7) % 7;
    date - Duration::days(offset)
}

/// The last day of the week containing `date`.
pub fn week_end(date: NaiveDate, first_day_of_week: u8) -> NaiveDate {
    week_start(date, first_day_of_week) + Duration::days(6)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let first = start_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .map(|next| next - Duration::days(1))
        .unwrap_or(date)
}

/// Shift a date by whole months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Resolve a wall-clock time in `tz` to a concrete instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times skipped by a
/// DST jump move forward past the gap.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        }
    }
}

/// Midnight at the start of `date` in `tz`.
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    resolve_local(date.and_time(NaiveTime::MIN), tz)
}

/// Wall-clock minutes elapsed since midnight.
pub fn minutes_since_midnight<T: Timelike>(time: &T) -> i64 {
    time.hour() as i64 * 60 + time.minute() as i64
}

/// `count` consecutive days beginning at `start`.
pub fn consecutive_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map(|offset| start + Duration::days(offset as i64))
        .collect()
}

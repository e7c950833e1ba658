// Date range module
// Inclusive day ranges used to query the calendar store

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::utils::date::day_start;

/// Inclusive range of calendar days, interpreted in `time_zone`.
///
/// The end day is inclusive up to its end: an occurrence starting at 23:59 on
/// `end` is inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub time_zone: Tz,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate, time_zone: Tz) -> Result<Self, String> {
        if end < start {
            return Err(format!("Range end {} is before start {}", end, start));
        }
        Ok(Self {
            start,
            end,
            time_zone,
        })
    }

    pub fn single_day(day: NaiveDate, time_zone: Tz) -> Self {
        Self {
            start: day,
            end: day,
            time_zone,
        }
    }

    /// First instant inside the range.
    pub fn start_instant(&self) -> DateTime<Utc> {
        day_start(self.start, self.time_zone).with_timezone(&Utc)
    }

    /// First instant after the range.
    pub fn end_instant_exclusive(&self) -> DateTime<Utc> {
        day_start(self.end + Duration::days(1), self.time_zone).with_timezone(&Utc)
    }

    /// Whether an interval `[start, end]` touches the range.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_instant_exclusive() && end >= self.start_instant()
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_reversed_range() {
        assert!(DateRange::new(date(2024, 5, 2), date(2024, 5, 1), Tz::UTC).is_err());
    }

    #[test]
    fn test_end_day_is_inclusive() {
        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 3), Tz::UTC).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 5, 3, 23, 59, 0).unwrap();
        assert!(range.intersects(late, late + Duration::minutes(30)));

        let next_day = Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap();
        assert!(!range.intersects(next_day, next_day + Duration::hours(1)));
        assert_eq!(range.day_count(), 3);
    }

    #[test]
    fn test_range_uses_time_zone_day_bounds() {
        let seoul = chrono_tz::Asia::Seoul;
        let range = DateRange::single_day(date(2024, 5, 1), seoul);
        // 2024-04-30 15:00 UTC is midnight May 1st in Seoul
        assert_eq!(
            range.start_instant(),
            Utc.with_ymd_and_hms(2024, 4, 30, 15, 0, 0).unwrap()
        );
    }
}

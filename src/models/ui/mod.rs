// UI models module
// Calendar view types and the day windows each one shows and loads

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::date_range::DateRange;
use crate::utils::date::{
    add_months, consecutive_days, end_of_month, start_of_month, week_end, week_start,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Month,
    #[default]
    Week,
    ThreeDays,
    Day,
    List,
}

impl ViewType {
    pub const ALL: [ViewType; 5] = [
        ViewType::Month,
        ViewType::Week,
        ViewType::ThreeDays,
        ViewType::Day,
        ViewType::List,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ViewType::Month => "Month",
            ViewType::Week => "Week",
            ViewType::ThreeDays => "3 Days",
            ViewType::Day => "Day",
            ViewType::List => "List",
        }
    }

    /// Number of day columns on the time grid, or `None` for non-timeline views.
    pub fn timeline_columns(&self) -> Option<usize> {
        match self {
            ViewType::Week => Some(7),
            ViewType::ThreeDays => Some(3),
            ViewType::Day => Some(1),
            ViewType::Month | ViewType::List => None,
        }
    }

    /// Days rendered by the view around `selected`.
    ///
    /// Month views return the full six-week grid so every row is a complete week.
    pub fn visible_days(&self, selected: NaiveDate, first_day_of_week: u8) -> Vec<NaiveDate> {
        match self {
            ViewType::Month => {
                let grid_start = week_start(start_of_month(selected), first_day_of_week);
                consecutive_days(grid_start, 42)
            }
            ViewType::Week => consecutive_days(week_start(selected, first_day_of_week), 7),
            ViewType::ThreeDays => consecutive_days(selected, 3),
            ViewType::Day => vec![selected],
            ViewType::List => {
                let range = self.fetch_range(selected, first_day_of_week, Tz::UTC);
                consecutive_days(range.start, range.day_count() as usize)
            }
        }
    }

    /// Window of days to load from the calendar store for this view.
    ///
    /// Each view prefetches around the visible days so paging stays instant.
    pub fn fetch_range(&self, selected: NaiveDate, first_day_of_week: u8, tz: Tz) -> DateRange {
        let (start, end) = match self {
            ViewType::Month => {
                let month_start = start_of_month(add_months(selected, -2));
                let month_end = end_of_month(add_months(selected, 2));
                (
                    week_start(month_start, first_day_of_week),
                    week_end(month_end, first_day_of_week),
                )
            }
            ViewType::List => (
                selected - Duration::days(30),
                selected + Duration::days(30),
            ),
            ViewType::Week => (
                week_start(selected - Duration::weeks(2), first_day_of_week),
                week_end(selected + Duration::weeks(2), first_day_of_week),
            ),
            ViewType::ThreeDays => (
                selected - Duration::days(6),
                selected + Duration::days(8),
            ),
            ViewType::Day => (
                selected - Duration::days(3),
                selected + Duration::days(3),
            ),
        };
        DateRange {
            start,
            end,
            time_zone: tz,
        }
    }

    /// Move `selected` one page forward or backward.
    pub fn step(&self, selected: NaiveDate, forward: bool) -> NaiveDate {
        let sign = if forward { 1 } else { -1 };
        match self {
            ViewType::Month => add_months(selected, sign),
            ViewType::Week | ViewType::List => selected + Duration::days(7 * sign as i64),
            ViewType::ThreeDays => selected + Duration::days(3 * sign as i64),
            ViewType::Day => selected + Duration::days(sign as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_visible_days_start_on_first_day() {
        let days = ViewType::Week.visible_days(date(2024, 12, 4), 0);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], date(2024, 12, 1));
        assert_eq!(days[6], date(2024, 12, 7));
    }

    #[test]
    fn test_month_grid_is_six_full_weeks() {
        let days = ViewType::Month.visible_days(date(2024, 2, 14), 1);
        assert_eq!(days.len(), 42);
        assert_eq!(days[0], date(2024, 1, 29));
    }

    #[test]
    fn test_fetch_range_per_view() {
        let selected = date(2024, 5, 15);
        let day = ViewType::Day.fetch_range(selected, 0, Tz::UTC);
        assert_eq!((day.start, day.end), (date(2024, 5, 12), date(2024, 5, 18)));

        let three = ViewType::ThreeDays.fetch_range(selected, 0, Tz::UTC);
        assert_eq!((three.start, three.end), (date(2024, 5, 9), date(2024, 5, 23)));

        let list = ViewType::List.fetch_range(selected, 0, Tz::UTC);
        assert_eq!(list.day_count(), 61);

        let week = ViewType::Week.fetch_range(selected, 0, Tz::UTC);
        assert_eq!((week.start, week.end), (date(2024, 4, 28), date(2024, 6, 1)));

        let month = ViewType::Month.fetch_range(selected, 0, Tz::UTC);
        assert_eq!((month.start, month.end), (date(2024, 3, 1) - Duration::days(5), date(2024, 7, 31) + Duration::days(3)));
    }

    #[test]
    fn test_step_pages_by_view_width() {
        let selected = date(2024, 1, 31);
        assert_eq!(ViewType::Month.step(selected, true), date(2024, 2, 29));
        assert_eq!(ViewType::ThreeDays.step(selected, false), date(2024, 1, 28));
        assert_eq!(ViewType::Day.step(selected, true), date(2024, 2, 1));
    }
}

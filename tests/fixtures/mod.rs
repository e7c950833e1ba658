// Test fixtures - reusable test data
// A fixed week of occurrences and a controller wired to an in-memory store

#![allow(dead_code)]

use std::sync::Arc;

use calendar_timeline::models::date_range::DateRange;
use calendar_timeline::models::occurrence::EventOccurrence;
use calendar_timeline::models::settings::TimelineSettings;
use calendar_timeline::services::bridge::InMemoryBridge;
use calendar_timeline::timeline::TimelineController;
use calendar_timeline::utils::date::consecutive_days;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Column width used by every controller fixture.
pub const COLUMN_WIDTH: f32 = 100.0;

/// Sunday, May 5 2024
pub fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()
}

pub fn week() -> Vec<NaiveDate> {
    consecutive_days(week_start(), 7)
}

pub fn week_range() -> DateRange {
    DateRange::new(week_start(), week_start() + Duration::days(6), Tz::UTC).unwrap()
}

/// UTC instant on `day_offset` days after the week start.
pub fn at(day_offset: i64, hour: u32, minute: u32) -> DateTime<Utc> {
    let day = week_start() + Duration::days(day_offset);
    Utc.from_utc_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
}

pub fn timed(id: &str, day_offset: i64, start: (u32, u32), end: (u32, u32)) -> EventOccurrence {
    EventOccurrence::new(
        id,
        id,
        at(day_offset, start.0, start.1),
        at(day_offset, end.0, end.1),
    )
    .unwrap()
}

pub fn read_only(id: &str, day_offset: i64, start: (u32, u32), end: (u32, u32)) -> EventOccurrence {
    EventOccurrence::builder()
        .id(id)
        .title(id)
        .start(at(day_offset, start.0, start.1))
        .end(at(day_offset, end.0, end.1))
        .read_only(true)
        .build()
        .unwrap()
}

pub fn all_day(id: &str, first_offset: i64, days: i64) -> EventOccurrence {
    EventOccurrence::builder()
        .id(id)
        .title(id)
        .start(at(first_offset, 0, 0))
        .end(at(first_offset + days, 0, 0))
        .all_day(true)
        .build()
        .unwrap()
}

/// Controller over `bridge` showing the fixture week with the whole day
/// visible, so nothing auto-scrolls unless a test shrinks the viewport.
pub fn controller_for(bridge: Arc<InMemoryBridge>) -> TimelineController {
    let mut controller = TimelineController::new(TimelineSettings::default(), bridge);
    controller.set_days(week());
    controller.set_column_width(COLUMN_WIDTH);
    controller.set_viewport_height(24.0 * 60.0);
    controller.load(&week_range()).unwrap();
    controller
}

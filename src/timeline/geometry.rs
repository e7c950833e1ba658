//! Time-grid geometry: conversions between pixels, minutes and day columns.
//!
//! Everything here is a pure function of the grid constants so the layout
//! engine and both gesture state machines agree on one coordinate system.
//! Vertical offsets are content coordinates: pixels from midnight of the day
//! column, independent of the current scroll offset.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::utils::date::{minutes_since_midnight, resolve_local};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Blocks are never drawn shorter than this so short events stay tappable.
pub const MIN_BLOCK_MINUTES: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    pub hour_height: f32,
    pub snap_minutes: u32,
    /// Wall clock the grid's rows represent
    pub time_zone: Tz,
}

impl TimeGrid {
    pub fn new(hour_height: f32, snap_minutes: u32, time_zone: Tz) -> Self {
        Self {
            hour_height,
            snap_minutes: snap_minutes.max(1),
            time_zone,
        }
    }

    pub fn day_height(&self) -> f32 {
        24.0 * self.hour_height
    }

    pub fn minutes_to_pixels(&self, minutes: f32) -> f32 {
        minutes * self.hour_height / 60.0
    }

    /// Inverse of [`minutes_to_pixels`](Self::minutes_to_pixels), rounded to whole minutes.
    pub fn pixels_to_minutes(&self, pixels: f32) -> i64 {
        (pixels * 60.0 / self.hour_height).round() as i64
    }

    /// Height of one snap step in pixels.
    pub fn snap_step(&self) -> f32 {
        self.minutes_to_pixels(self.snap_minutes as f32)
    }

    /// Round to the nearest multiple of the snap step.
    pub fn snap(&self, pixels: f32) -> f32 {
        let step = self.snap_step();
        (pixels / step).round() * step
    }

    pub fn min_block_height(&self) -> f32 {
        self.minutes_to_pixels(MIN_BLOCK_MINUTES)
    }

    /// Vertical offset of an instant within its own day on this grid's clock.
    pub fn offset_of(&self, instant: DateTime<Utc>) -> f32 {
        let local = instant.with_timezone(&self.time_zone);
        self.minutes_to_pixels(minutes_since_midnight(&local) as f32)
    }

    /// The instant at `minutes` past midnight of `day`, read on this grid's clock.
    pub fn instant_at(&self, day: NaiveDate, minutes: i64) -> DateTime<Utc> {
        let wall = day.and_time(chrono::NaiveTime::MIN) + Duration::minutes(minutes);
        resolve_local(wall, self.time_zone).with_timezone(&Utc)
    }
}

/// What a gesture session needs to know about the visible grid.
#[derive(Debug, Clone, Copy)]
pub struct SessionGeometry<'a> {
    pub grid: &'a TimeGrid,
    pub days: &'a [NaiveDate],
    pub column_width: f32,
}

impl SessionGeometry<'_> {
    pub fn column_count(&self) -> usize {
        self.days.len()
    }

    /// Column under content `x`, pinned to the first column for single-day views.
    pub fn column_at(&self, x: f32) -> usize {
        if self.column_count() > 1 {
            column_for_x(x, self.column_width, self.column_count())
        } else {
            0
        }
    }
}

/// Day column under horizontal position `x`.
///
/// Positions outside the grid clamp to the first or last column so an
/// overshooting drag still lands on a real day.
pub fn column_for_x(x: f32, column_width: f32, column_count: usize) -> usize {
    if column_count == 0 || column_width <= 0.0 || !x.is_finite() {
        return 0;
    }
    let column = (x / column_width).floor();
    if column <= 0.0 {
        0
    } else {
        (column as usize).min(column_count - 1)
    }
}

/// Clamp a start minute so the event neither starts before midnight nor
/// runs past the end of the day.
///
/// Durations longer than a day can only start at midnight.
pub fn clamp_start(start_minutes: i64, duration_minutes: i64) -> i64 {
    let max_start = (MINUTES_PER_DAY - duration_minutes.max(0)).max(0);
    start_minutes.clamp(0, max_start)
}

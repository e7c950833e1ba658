// Settings module
// Tunable constants for the time grid and its gestures

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::ui::ViewType;
use crate::timeline::geometry::TimeGrid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Pixels per hour on the time grid
    pub hour_height: f32,
    /// Snap interval for everything shown or committed
    pub snap_minutes: u32,
    /// Hold time before a press turns into a drag or create gesture
    pub long_press_ms: u64,
    /// Initial length of a drag-to-create interval
    pub default_create_minutes: u32,
    /// Shortest interval drag-to-create can produce
    pub min_create_minutes: u32,
    /// Distance from the viewport edge that starts auto-scroll
    pub edge_threshold: f32,
    pub scroll_speed_px_per_sec: f32,
    /// Rows of multi-day events shown per week before counting overflow
    pub week_band_max_rows: usize,
    /// 0 = Sunday, 1 = Monday, etc.
    pub first_day_of_week: u8,
    /// Movement allowed before a press is treated as a scroll
    pub press_slop: f32,
    /// How long a move may stay unconfirmed before it is rolled back
    pub commit_timeout_ms: u64,
    pub time_zone: Tz,
    pub default_view: ViewType,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            hour_height: 60.0,
            snap_minutes: 15,
            long_press_ms: 400,
            default_create_minutes: 60,
            min_create_minutes: 30,
            edge_threshold: 60.0,
            scroll_speed_px_per_sec: 600.0,
            week_band_max_rows: 3,
            first_day_of_week: 0, // Sunday
            press_slop: 8.0,
            commit_timeout_ms: 10_000,
            time_zone: Tz::UTC,
            default_view: ViewType::Week,
        }
    }
}

impl TimelineSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.hour_height.is_finite() && self.hour_height > 0.0) {
            return Err("Hour height must be a positive number".to_string());
        }

        if self.snap_minutes == 0 || self.snap_minutes > 60 || 60 % self.snap_minutes != 0 {
            return Err("Snap interval must divide an hour evenly".to_string());
        }

        if self.min_create_minutes == 0 {
            return Err("Minimum create duration must be positive".to_string());
        }

        if self.min_create_minutes > self.default_create_minutes {
            return Err(
                "Minimum create duration cannot exceed the default duration".to_string(),
            );
        }

        if self.default_create_minutes > 24 * 60 {
            return Err("Default create duration cannot exceed one day".to_string());
        }

        if !(self.edge_threshold > 0.0 && self.scroll_speed_px_per_sec > 0.0) {
            return Err("Auto-scroll threshold and speed must be positive".to_string());
        }

        if self.week_band_max_rows == 0 {
            return Err("Week band needs at least one row".to_string());
        }

        if self.first_day_of_week > 6 {
            return Err("First day of week must be between 0 and 6".to_string());
        }

        Ok(())
    }

    pub fn grid(&self) -> TimeGrid {
        TimeGrid::new(self.hour_height, self.snap_minutes, self.time_zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(TimelineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_snap_must_divide_hour() {
        let settings = TimelineSettings {
            snap_minutes: 7,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_min_create_cannot_exceed_default() {
        let settings = TimelineSettings {
            min_create_minutes: 90,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: TimelineSettings =
            toml::from_str("hour_height = 48.0\ntime_zone = \"Asia/Seoul\"\n").unwrap();
        assert_eq!(settings.hour_height, 48.0);
        assert_eq!(settings.time_zone, chrono_tz::Asia::Seoul);
        assert_eq!(settings.snap_minutes, 15);
        assert_eq!(settings.default_view, ViewType::Week);
    }
}

// Occurrence module
// One renderable instance of a calendar event, as the calendar store reports it

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A start or end instant with the zone it was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub instant: DateTime<Utc>,
    pub time_zone: Tz,
    pub all_day: bool,
}

impl CalendarDate {
    pub fn new(instant: DateTime<Utc>, time_zone: Tz, all_day: bool) -> Self {
        Self {
            instant,
            time_zone,
            all_day,
        }
    }

    pub fn timed(instant: DateTime<Utc>, time_zone: Tz) -> Self {
        Self::new(instant, time_zone, false)
    }

    /// The instant as seen on a wall clock in `tz`.
    pub fn in_zone(&self, tz: Tz) -> DateTime<Tz> {
        self.instant.with_timezone(&tz)
    }

    pub fn date_in(&self, tz: Tz) -> NaiveDate {
        self.in_zone(tz).date_naive()
    }
}

/// One occurrence of a calendar event.
///
/// Recurring events are expanded upstream; each occurrence carries its own
/// `id` while sharing `event_id` with its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOccurrence {
    pub id: String,
    pub event_id: String,
    pub calendar_id: String,
    pub title: String,
    pub start: CalendarDate,
    pub end: CalendarDate,
    pub color: String,
    pub read_only: bool,
}

/// Partial update sent to the calendar store. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrencePatch {
    pub title: Option<String>,
    pub start: Option<CalendarDate>,
    pub end: Option<CalendarDate>,
}

impl OccurrencePatch {
    /// Patch that reschedules an occurrence without touching other fields.
    pub fn reschedule(start: CalendarDate, end: CalendarDate) -> Self {
        Self {
            title: None,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start.is_none() && self.end.is_none()
    }
}

impl EventOccurrence {
    /// Create a timed occurrence with required fields
    ///
    /// # Examples
    /// ```
    /// use calendar_timeline::models::occurrence::EventOccurrence;
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    /// let occurrence =
    ///     EventOccurrence::new("occ-1", "Standup", start, start + Duration::minutes(15)).unwrap();
    /// assert_eq!(occurrence.duration_minutes(), 15);
    /// ```
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, String> {
        Self::builder()
            .id(id)
            .title(title)
            .start(start)
            .end(end)
            .build()
    }

    /// Create a builder for constructing occurrences with optional fields
    pub fn builder() -> OccurrenceBuilder {
        OccurrenceBuilder::new()
    }

    /// Validate the occurrence
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Occurrence id cannot be empty".to_string());
        }

        if self.end.instant < self.start.instant {
            return Err(format!(
                "Occurrence '{}' ends before it starts",
                self.id
            ));
        }

        if !is_hex_color(&self.color) {
            return Err("Color must be in hex format (#RRGGBB or #RGB)".to_string());
        }

        Ok(())
    }

    pub fn is_all_day(&self) -> bool {
        self.start.all_day
    }

    /// Timed, writable occurrences can be dragged on the time grid.
    pub fn is_draggable(&self) -> bool {
        !self.read_only && !self.is_all_day()
    }

    pub fn duration(&self) -> Duration {
        self.end.instant - self.start.instant
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    pub fn start_date(&self, tz: Tz) -> NaiveDate {
        self.start.date_in(tz)
    }

    /// Last calendar day the occurrence covers.
    ///
    /// An end exactly at midnight belongs to the previous day, so a 22:00-00:00
    /// event stays on one day.
    pub fn last_date(&self, tz: Tz) -> NaiveDate {
        let end = self.end.in_zone(tz);
        let end_date = end.date_naive();
        let at_midnight = end.time() == chrono::NaiveTime::MIN;
        if at_midnight && self.end.instant > self.start.instant {
            (end_date - Duration::days(1)).max(self.start_date(tz))
        } else {
            end_date
        }
    }

    pub fn spans_multiple_days(&self, tz: Tz) -> bool {
        self.last_date(tz) > self.start_date(tz)
    }

    /// Whether the occurrence's day span covers `day`.
    pub fn covers_day(&self, day: NaiveDate, tz: Tz) -> bool {
        day >= self.start_date(tz) && day <= self.last_date(tz)
    }

    /// Return a copy with `patch` applied.
    ///
    /// Only the fields a patch touches are checked: a record loaded with a
    /// color the builder would refuse can still be rescheduled.
    pub fn patched(&self, patch: &OccurrencePatch) -> Result<Self, String> {
        let mut updated = self.clone();
        if let Some(title) = &patch.title {
            updated.title = title.clone();
        }
        if let Some(start) = patch.start {
            updated.start = start;
        }
        if let Some(end) = patch.end {
            updated.end = end;
        }
        if updated.end.instant < updated.start.instant {
            return Err(format!("Occurrence '{}' ends before it starts", updated.id));
        }
        Ok(updated)
    }
}

fn is_hex_color(color: &str) -> bool {
    color.starts_with('#')
        && (color.len() == 7 || color.len() == 4)
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Builder for creating occurrences with optional fields
pub struct OccurrenceBuilder {
    id: Option<String>,
    event_id: Option<String>,
    calendar_id: Option<String>,
    title: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    time_zone: Tz,
    all_day: bool,
    color: Option<String>,
    read_only: bool,
}

impl OccurrenceBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            event_id: None,
            calendar_id: None,
            title: None,
            start: None,
            end: None,
            time_zone: Tz::UTC,
            all_day: false,
            color: None,
            read_only: false,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Owning event id; defaults to the occurrence id
    pub fn event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    pub fn calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// IANA zone both instants were authored in
    pub fn time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Set the display color (hex format)
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn build(self) -> Result<EventOccurrence, String> {
        let id = self.id.ok_or("Occurrence id is required")?;
        let title = self.title.ok_or("Occurrence title is required")?;
        let start = self.start.ok_or("Occurrence start time is required")?;
        let end = self.end.ok_or("Occurrence end time is required")?;

        let occurrence = EventOccurrence {
            event_id: self.event_id.unwrap_or_else(|| id.clone()),
            calendar_id: self.calendar_id.unwrap_or_else(|| "default".to_string()),
            id,
            title,
            start: CalendarDate::new(start, self.time_zone, self.all_day),
            end: CalendarDate::new(end, self.time_zone, self.all_day),
            color: self.color.unwrap_or_else(|| "#4A90D9".to_string()),
            read_only: self.read_only,
        };

        occurrence.validate()?;
        Ok(occurrence)
    }
}

impl Default for OccurrenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_new_occurrence_success() {
        let occurrence = EventOccurrence::new("a", "Meeting", at(9, 0), at(10, 0)).unwrap();
        assert_eq!(occurrence.event_id, "a");
        assert_eq!(occurrence.duration_minutes(), 60);
        assert!(occurrence.is_draggable());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let result = EventOccurrence::new("a", "Meeting", at(10, 0), at(9, 0));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("ends before it starts"));
    }

    #[test]
    fn test_zero_length_occurrence_is_valid() {
        assert!(EventOccurrence::new("a", "Reminder", at(9, 0), at(9, 0)).is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_color() {
        let result = EventOccurrence::builder()
            .id("a")
            .title("Meeting")
            .start(at(9, 0))
            .end(at(10, 0))
            .color("blue")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_only_and_all_day_are_not_draggable() {
        let read_only = EventOccurrence::builder()
            .id("a")
            .title("Holiday feed")
            .start(at(9, 0))
            .end(at(10, 0))
            .read_only(true)
            .build()
            .unwrap();
        assert!(!read_only.is_draggable());

        let all_day = EventOccurrence::builder()
            .id("b")
            .title("Offsite")
            .start(at(0, 0))
            .end(at(23, 59))
            .all_day(true)
            .build()
            .unwrap();
        assert!(!all_day.is_draggable());
    }

    #[test]
    fn test_last_date_excludes_midnight_end() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let occurrence = EventOccurrence::new("a", "Late", start, end).unwrap();
        assert_eq!(occurrence.last_date(Tz::UTC), start.date_naive());
        assert!(!occurrence.spans_multiple_days(Tz::UTC));
    }

    #[test]
    fn test_patch_moves_start_and_end_only() {
        let occurrence = EventOccurrence::new("a", "Meeting", at(9, 0), at(10, 0)).unwrap();
        let patch = OccurrencePatch::reschedule(
            CalendarDate::timed(at(11, 0), Tz::UTC),
            CalendarDate::timed(at(12, 0), Tz::UTC),
        );
        let moved = occurrence.patched(&patch).unwrap();
        assert_eq!(moved.start.instant, at(11, 0));
        assert_eq!(moved.title, "Meeting");
    }

    #[test]
    fn test_patch_that_inverts_times_is_rejected() {
        let occurrence = EventOccurrence::new("a", "Meeting", at(9, 0), at(10, 0)).unwrap();
        let patch = OccurrencePatch {
            start: Some(CalendarDate::timed(at(11, 0), Tz::UTC)),
            ..Default::default()
        };
        assert!(occurrence.patched(&patch).is_err());
    }

    #[test]
    fn test_patch_ignores_unrelated_fields() {
        let mut occurrence = EventOccurrence::new("a", "Meeting", at(9, 0), at(10, 0)).unwrap();
        // ARGB colors arrive from stores that skip the builder
        occurrence.color = "#4285F4FF".to_string();
        let patch = OccurrencePatch::reschedule(
            CalendarDate::timed(at(11, 0), Tz::UTC),
            CalendarDate::timed(at(12, 0), Tz::UTC),
        );
        let moved = occurrence.patched(&patch).unwrap();
        assert_eq!(moved.start.instant, at(11, 0));
        assert_eq!(moved.color, "#4285F4FF");
    }
}

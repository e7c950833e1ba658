//! The calendar store as seen by the timeline.
//!
//! Storage, sync and notifications live behind this trait. The timeline only
//! reads occurrences for a date range, patches moved occurrences and hands
//! over finished create gestures.

mod memory;

pub use memory::InMemoryBridge;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::models::date_range::DateRange;
use crate::models::occurrence::{EventOccurrence, OccurrencePatch};

/// Failures reported by the calendar store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Occurrence not found: {0}")]
    NotFound(String),

    #[error("Change rejected: {0}")]
    Rejected(String),

    #[error("Calendar store did not answer in time")]
    Timeout,

    #[error("Calendar store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a drag-to-create gesture, handed to the caller to turn into an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Zone the grid was showing when the interval was drawn
    pub time_zone: Tz,
}

impl CreateRequest {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait CalendarBridge: Send + Sync {
    /// Occurrences intersecting `range`. An empty `calendar_ids` means every calendar.
    fn fetch_occurrences(
        &self,
        range: &DateRange,
        calendar_ids: &[String],
    ) -> Result<Vec<EventOccurrence>, BridgeError>;

    fn update_occurrence(&self, id: &str, patch: &OccurrencePatch) -> Result<(), BridgeError>;

    fn request_create_occurrence(&self, request: &CreateRequest) -> Result<(), BridgeError>;
}

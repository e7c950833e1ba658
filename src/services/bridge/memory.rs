use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use super::{BridgeError, CalendarBridge, CreateRequest, DateRange};
use crate::models::occurrence::{EventOccurrence, OccurrencePatch};
use crate::utils::date::resolve_local;

/// Calendar store kept in process memory.
///
/// Backs the desktop shell when no native store is attached, and the tests.
/// Updates can be forced to fail to exercise rollback.
#[derive(Debug, Default)]
pub struct InMemoryBridge {
    occurrences: Mutex<Vec<EventOccurrence>>,
    created: Mutex<Vec<CreateRequest>>,
    fail_updates: AtomicBool,
}

fn poisoned<T>(_: T) -> BridgeError {
    BridgeError::Unavailable("store lock poisoned".to_string())
}

impl InMemoryBridge {
    pub fn new(occurrences: Vec<EventOccurrence>) -> Self {
        Self {
            occurrences: Mutex::new(occurrences),
            ..Default::default()
        }
    }

    /// Load occurrences from a JSON array file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read occurrences from {}", path.display()))?;
        let occurrences: Vec<EventOccurrence> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse occurrences in {}", path.display()))?;

        for occurrence in &occurrences {
            if let Err(e) = occurrence.validate() {
                log::warn!("Loaded invalid occurrence '{}': {}", occurrence.id, e);
            }
        }

        log::info!("Loaded {} occurrences from {}", occurrences.len(), path.display());
        Ok(Self::new(occurrences))
    }

    /// A week of demo events around `week_start`, read on `tz`'s wall clock.
    pub fn with_sample_week(week_start: NaiveDate, tz: Tz) -> Self {
        let at = |day: i64, hour: u32, minute: u32| {
            let date = week_start + Duration::days(day);
            let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
            resolve_local(date.and_time(time), tz).with_timezone(&Utc)
        };

        let samples: [(&str, i64, (u32, u32), (u32, u32), &str, bool); 8] = [
            ("Standup", 1, (9, 0), (9, 15), "#4A90D9", false),
            ("Design review", 1, (9, 0), (10, 30), "#E67E22", false),
            ("Lunch", 1, (12, 0), (13, 0), "#27AE60", false),
            ("1:1", 2, (14, 0), (14, 30), "#8E44AD", false),
            ("Focus block", 2, (14, 15), (16, 0), "#4A90D9", false),
            ("Planning", 3, (10, 0), (11, 0), "#C0392B", false),
            ("Team offsite", 4, (8, 0), (17, 0), "#16A085", false),
            ("Public holiday feed", 5, (11, 0), (12, 0), "#7F8C8D", true),
        ];

        let mut occurrences: Vec<EventOccurrence> = samples
            .iter()
            .enumerate()
            .filter_map(|(i, (title, day, start, end, color, read_only))| {
                EventOccurrence::builder()
                    .id(format!("sample-{}", i))
                    .title(*title)
                    .start(at(*day, start.0, start.1))
                    .end(at(*day, end.0, end.1))
                    .time_zone(tz)
                    .color(*color)
                    .read_only(*read_only)
                    .build()
                    .ok()
            })
            .collect();

        if let Ok(trip) = EventOccurrence::builder()
            .id("sample-trip")
            .title("Conference")
            .start(at(2, 0, 0))
            .end(at(5, 0, 0))
            .time_zone(tz)
            .all_day(true)
            .color("#D35400")
            .build()
        {
            occurrences.push(trip);
        }

        Self::new(occurrences)
    }

    /// Make every following update fail with [`BridgeError::Rejected`].
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn created_requests(&self) -> Vec<CreateRequest> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<EventOccurrence> {
        self.occurrences
            .lock()
            .ok()?
            .iter()
            .find(|occurrence| occurrence.id == id)
            .cloned()
    }
}

impl CalendarBridge for InMemoryBridge {
    fn fetch_occurrences(
        &self,
        range: &DateRange,
        calendar_ids: &[String],
    ) -> Result<Vec<EventOccurrence>, BridgeError> {
        let occurrences = self.occurrences.lock().map_err(poisoned)?;
        Ok(occurrences
            .iter()
            .filter(|occurrence| {
                calendar_ids.is_empty() || calendar_ids.contains(&occurrence.calendar_id)
            })
            .filter(|occurrence| range.intersects(occurrence.start.instant, occurrence.end.instant))
            .cloned()
            .collect())
    }

    fn update_occurrence(&self, id: &str, patch: &OccurrencePatch) -> Result<(), BridgeError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(BridgeError::Rejected(format!("updates disabled for '{}'", id)));
        }

        let mut occurrences = self.occurrences.lock().map_err(poisoned)?;
        let slot = occurrences
            .iter_mut()
            .find(|occurrence| occurrence.id == id)
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;

        if slot.read_only {
            return Err(BridgeError::Rejected(format!("'{}' is read-only", id)));
        }
        *slot = slot.patched(patch).map_err(BridgeError::Rejected)?;
        Ok(())
    }

    fn request_create_occurrence(&self, request: &CreateRequest) -> Result<(), BridgeError> {
        self.created.lock().map_err(poisoned)?.push(request.clone());
        Ok(())
    }
}

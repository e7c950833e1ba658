//! Row packing for events shown as horizontal bars across a week.
//!
//! Used by the month grid (one band per week row) and the all-day strip
//! above the time grid. Each occurrence gets a column span and the first row
//! whose columns are all free; rows past the limit become per-day overflow
//! counts.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::models::occurrence::EventOccurrence;

/// Widest window a band can pack; one bit per column.
pub const MAX_BAND_COLUMNS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct BandBlock {
    pub occurrence: EventOccurrence,
    pub start_column: usize,
    /// Inclusive
    pub end_column: usize,
    pub row: usize,
}

impl BandBlock {
    pub fn span(&self) -> usize {
        self.end_column - self.start_column + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekBandLayout {
    pub blocks: Vec<BandBlock>,
    /// Hidden occurrences per column
    pub overflow_per_day: Vec<usize>,
    /// Rows actually rendered, at most the requested maximum
    pub row_count: usize,
}

struct Candidate<'a> {
    occurrence: &'a EventOccurrence,
    start_column: usize,
    end_column: usize,
}

impl Candidate<'_> {
    fn span(&self) -> usize {
        self.end_column - self.start_column + 1
    }

    fn mask(&self) -> u64 {
        let width = self.span();
        let bits = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
        bits << self.start_column
    }
}

/// Column span of an occurrence inside `days`, or `None` when it misses the window.
fn columns_in_window(
    occurrence: &EventOccurrence,
    days: &[NaiveDate],
    tz: Tz,
) -> Option<(usize, usize)> {
    let first = occurrence.start_date(tz);
    let last = occurrence.last_date(tz);
    let start_column = days.iter().position(|day| *day >= first)?;
    let end_column = days.iter().rposition(|day| *day <= last)?;
    (start_column <= end_column).then_some((start_column, end_column))
}

/// Pack `occurrences` into rows over `days`.
///
/// Ordering decides who gets the top rows: all-day before timed, then wider
/// spans first, then earlier start columns. Equal keys keep input order.
pub fn layout_week_band(
    occurrences: &[EventOccurrence],
    days: &[NaiveDate],
    max_rows: usize,
    tz: Tz,
) -> WeekBandLayout {
    let days = if days.len() > MAX_BAND_COLUMNS {
        log::warn!(
            "Week band limited to {} columns, got {}",
            MAX_BAND_COLUMNS,
            days.len()
        );
        &days[..MAX_BAND_COLUMNS]
    } else {
        days
    };

    let mut candidates: Vec<Candidate> = occurrences
        .iter()
        .filter(|occurrence| {
            if occurrence.end.instant < occurrence.start.instant {
                log::warn!(
                    "Skipping occurrence '{}' in week band: ends before it starts",
                    occurrence.id
                );
                return false;
            }
            true
        })
        .filter_map(|occurrence| {
            columns_in_window(occurrence, days, tz).map(|(start_column, end_column)| Candidate {
                occurrence,
                start_column,
                end_column,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.occurrence
            .is_all_day()
            .cmp(&a.occurrence.is_all_day())
            .then_with(|| b.span().cmp(&a.span()))
            .then_with(|| a.start_column.cmp(&b.start_column))
    });

    let mut rows: Vec<u64> = Vec::new();
    let mut overflow_per_day = vec![0; days.len()];
    let mut blocks = Vec::new();

    for candidate in candidates {
        let mask = candidate.mask();
        let row = match rows.iter().position(|occupied| occupied & mask == 0) {
            Some(row) => row,
            None => {
                rows.push(0);
                rows.len() - 1
            }
        };
        rows[row] |= mask;

        if row >= max_rows {
            for count in &mut overflow_per_day[candidate.start_column..=candidate.end_column] {
                *count += 1;
            }
            continue;
        }

        blocks.push(BandBlock {
            occurrence: candidate.occurrence.clone(),
            start_column: candidate.start_column,
            end_column: candidate.end_column,
            row,
        });
    }

    WeekBandLayout {
        blocks,
        overflow_per_day,
        row_count: rows.len().min(max_rows),
    }
}

/// All-day occurrences covering `day`, for the strip above the time grid.
pub fn all_day_for_day<'a>(
    occurrences: &'a [EventOccurrence],
    day: NaiveDate,
    tz: Tz,
) -> Vec<&'a EventOccurrence> {
    occurrences
        .iter()
        .filter(|occurrence| occurrence.is_all_day() && occurrence.covers_day(day, tz))
        .collect()
}

/// Every occurrence, timed or all-day, whose day span covers `day`.
pub fn occurrences_for_day<'a>(
    occurrences: &'a [EventOccurrence],
    day: NaiveDate,
    tz: Tz,
) -> Vec<&'a EventOccurrence> {
    occurrences
        .iter()
        .filter(|occurrence| occurrence.covers_day(day, tz))
        .collect()
}

/// Occurrences grouped into day sections for the list view, ordered by start.
pub fn group_by_day(
    occurrences: &[EventOccurrence],
    tz: Tz,
) -> Vec<(NaiveDate, Vec<&EventOccurrence>)> {
    let mut sorted: Vec<&EventOccurrence> = occurrences.iter().collect();
    sorted.sort_by_key(|occurrence| occurrence.start.instant);

    let mut sections: Vec<(NaiveDate, Vec<&EventOccurrence>)> = Vec::new();
    for occurrence in sorted {
        let day = occurrence.start_date(tz);
        match sections.last_mut() {
            Some((current, items)) if *current == day => items.push(occurrence),
            _ => sections.push((day, vec![occurrence])),
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::consecutive_days;
    use chrono::{TimeZone, Utc};

    fn week() -> Vec<NaiveDate> {
        consecutive_days(NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(), 7)
    }

    fn spanning(id: &str, first: u32, last: u32, all_day: bool) -> EventOccurrence {
        EventOccurrence::builder()
            .id(id)
            .title(id)
            .start(Utc.with_ymd_and_hms(2024, 5, first, 0, 0, 0).unwrap())
            .end(Utc.with_ymd_and_hms(2024, 5, last, 23, 0, 0).unwrap())
            .all_day(all_day)
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_week_events_overflow_past_max_rows() {
        let occurrences: Vec<_> = (0..4)
            .map(|i| spanning(&format!("e{}", i), 5, 11, true))
            .collect();
        let layout = layout_week_band(&occurrences, &week(), 3, Tz::UTC);

        assert_eq!(layout.blocks.len(), 3);
        let rows: Vec<usize> = layout.blocks.iter().map(|b| b.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
        assert_eq!(layout.overflow_per_day, vec![1; 7]);
        assert_eq!(layout.row_count, 3);
    }

    #[test]
    fn test_span_is_clipped_to_window() {
        let occurrences = vec![spanning("long", 1, 7, true)];
        let layout = layout_week_band(&occurrences, &week(), 3, Tz::UTC);
        assert_eq!(layout.blocks[0].start_column, 0);
        assert_eq!(layout.blocks[0].end_column, 2);
    }

    #[test]
    fn test_outside_window_is_dropped() {
        let occurrences = vec![spanning("early", 1, 3, true)];
        let layout = layout_week_band(&occurrences, &week(), 3, Tz::UTC);
        assert!(layout.blocks.is_empty());
        assert_eq!(layout.row_count, 0);
    }

    #[test]
    fn test_all_day_and_wide_events_win_top_rows() {
        let occurrences = vec![
            spanning("timed-short", 6, 6, false),
            spanning("allday-short", 6, 6, true),
            spanning("allday-wide", 5, 8, true),
        ];
        let layout = layout_week_band(&occurrences, &week(), 5, Tz::UTC);
        let order: Vec<(&str, usize)> = layout
            .blocks
            .iter()
            .map(|b| (b.occurrence.id.as_str(), b.row))
            .collect();
        assert_eq!(
            order,
            vec![("allday-wide", 0), ("allday-short", 1), ("timed-short", 2)]
        );
    }

    #[test]
    fn test_disjoint_spans_share_a_row() {
        let occurrences = vec![spanning("a", 5, 6, true), spanning("b", 8, 9, true)];
        let layout = layout_week_band(&occurrences, &week(), 3, Tz::UTC);
        assert!(layout.blocks.iter().all(|b| b.row == 0));
    }

    #[test]
    fn test_group_by_day_orders_sections() {
        let occurrences = vec![
            spanning("later", 7, 7, false),
            spanning("first", 5, 5, false),
            spanning("second", 5, 5, true),
        ];
        let sections = group_by_day(&occurrences, Tz::UTC);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].1.len(), 2);
        assert_eq!(sections[1].1[0].id, "later");
    }

    #[test]
    fn test_day_filters() {
        let occurrences = vec![spanning("trip", 5, 7, true), spanning("call", 6, 6, false)];
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(all_day_for_day(&occurrences, day, Tz::UTC).len(), 1);
        assert_eq!(occurrences_for_day(&occurrences, day, Tz::UTC).len(), 2);
    }
}

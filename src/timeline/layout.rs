//! Overlap layout for timed occurrences on the time grid.
//!
//! Occurrences are grouped into overlap clusters per day and split the
//! column evenly inside their cluster. Grouping is a greedy single pass in
//! start order: an occurrence joins the open cluster when it overlaps any
//! member. Two occurrences that only share a neighbour still end up in the
//! same cluster and get narrower slots than strictly needed.

use chrono::NaiveDate;
use egui::{Pos2, Rect, Vec2};

use super::geometry::TimeGrid;
use crate::models::occurrence::EventOccurrence;
use crate::utils::date::minutes_since_midnight;

/// Horizontal gap kept between neighbouring blocks.
pub const BLOCK_GAP: f32 = 1.0;

/// One occurrence placed on one day column.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedBlock {
    pub occurrence: EventOccurrence,
    /// Pixels from the top of the day
    pub top: f32,
    pub height: f32,
    /// Position inside the overlap cluster
    pub slot: usize,
    pub slot_count: usize,
    pub column: usize,
}

impl PositionedBlock {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Left edge as a fraction of the column width.
    pub fn left_fraction(&self) -> f32 {
        self.slot as f32 / self.slot_count as f32
    }

    pub fn width_fraction(&self) -> f32 {
        1.0 / self.slot_count as f32
    }

    pub fn is_draggable(&self) -> bool {
        self.occurrence.is_draggable()
    }

    /// Block rect in content coordinates, x measured from the first day column.
    pub fn rect(&self, column_width: f32) -> Rect {
        let x = self.column as f32 * column_width + self.left_fraction() * column_width;
        let width = (self.width_fraction() * column_width - BLOCK_GAP).max(0.0);
        Rect::from_min_size(Pos2::new(x, self.top), Vec2::new(width, self.height))
    }
}

fn overlaps(a: &EventOccurrence, b: &EventOccurrence) -> bool {
    a.start.instant < b.end.instant && b.start.instant < a.end.instant
}

/// Split start-ordered occurrences into overlap clusters.
fn group_overlapping<'a>(sorted: &[&'a EventOccurrence]) -> Vec<Vec<&'a EventOccurrence>> {
    let mut groups: Vec<Vec<&EventOccurrence>> = Vec::new();
    let mut current: Vec<&EventOccurrence> = Vec::new();

    for &occurrence in sorted {
        if current.is_empty() || current.iter().any(|member| overlaps(member, occurrence)) {
            current.push(occurrence);
        } else {
            groups.push(std::mem::take(&mut current));
            current.push(occurrence);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Lay out the timed occurrences starting on `day` into `column`.
///
/// Occurrences that end before they start are skipped so a single bad record
/// cannot blank the grid.
pub fn layout_day(
    occurrences: &[EventOccurrence],
    day: NaiveDate,
    column: usize,
    grid: &TimeGrid,
) -> Vec<PositionedBlock> {
    let tz = grid.time_zone;

    let mut day_occurrences: Vec<&EventOccurrence> = occurrences
        .iter()
        .filter(|occurrence| !occurrence.is_all_day())
        .filter(|occurrence| occurrence.start_date(tz) == day)
        .filter(|occurrence| {
            if occurrence.end.instant < occurrence.start.instant {
                log::warn!(
                    "Skipping occurrence '{}' in layout: ends before it starts",
                    occurrence.id
                );
                return false;
            }
            true
        })
        .collect();

    // Stable sort keeps input order for equal starts
    day_occurrences.sort_by_key(|occurrence| occurrence.start.instant);

    let mut blocks = Vec::with_capacity(day_occurrences.len());
    for group in group_overlapping(&day_occurrences) {
        let slot_count = group.len();
        for (slot, occurrence) in group.into_iter().enumerate() {
            let start = grid.offset_of(occurrence.start.instant);
            let bottom = end_offset(occurrence, day, grid);
            let height = (bottom - start).max(grid.min_block_height());
            // A floored block near midnight is lifted to end at the day's edge
            let top = start.min(grid.day_height() - height).max(0.0);

            blocks.push(PositionedBlock {
                occurrence: occurrence.clone(),
                top,
                height,
                slot,
                slot_count,
                column,
            });
        }
    }

    blocks
}

/// Bottom offset of an occurrence on `day`; ends on a later day stop at midnight.
fn end_offset(occurrence: &EventOccurrence, day: NaiveDate, grid: &TimeGrid) -> f32 {
    let end = occurrence.end.in_zone(grid.time_zone);
    if end.date_naive() > day {
        grid.day_height()
    } else {
        grid.minutes_to_pixels(minutes_since_midnight(&end) as f32)
    }
}

/// Lay out every visible day, column index following `days` order.
pub fn layout_days(
    occurrences: &[EventOccurrence],
    days: &[NaiveDate],
    grid: &TimeGrid,
) -> Vec<PositionedBlock> {
    days.iter()
        .enumerate()
        .flat_map(|(column, day)| layout_day(occurrences, *day, column, grid))
        .collect()
}

/// Block under `point` (content coordinates).
///
/// When rects overlap the block laid out last wins, which is also the one
/// painted on top.
pub fn hit_test(
    blocks: &[PositionedBlock],
    point: Pos2,
    column_width: f32,
) -> Option<&PositionedBlock> {
    blocks
        .iter()
        .rev()
        .find(|block| block.rect(column_width).contains(point))
}

// Property-based tests for the layout engine, grid geometry and gestures

mod fixtures;

use calendar_timeline::models::occurrence::EventOccurrence;
use calendar_timeline::services::repository::OccurrenceRepository;
use calendar_timeline::timeline::create::{grow_edges, initial_edges, CreateLimits};
use calendar_timeline::timeline::drag::{self, DragEffect, DragInput};
use calendar_timeline::timeline::geometry::{clamp_start, SessionGeometry, MINUTES_PER_DAY};
use calendar_timeline::timeline::layout::layout_day;
use calendar_timeline::timeline::week_band::layout_week_band;
use calendar_timeline::timeline::TimeGrid;
use chrono::Duration;
use chrono_tz::Tz;
use egui::Vec2;
use fixtures::*;
use proptest::prelude::*;

fn grid() -> TimeGrid {
    TimeGrid::new(60.0, 15, Tz::UTC)
}

/// Up to 12 timed occurrences on the fixture Monday, starting on the quarter hour.
fn monday_events() -> impl Strategy<Value = Vec<EventOccurrence>> {
    prop::collection::vec((0i64..(24 * 4), 1i64..=16), 0..12).prop_map(|samples| {
        samples
            .into_iter()
            .enumerate()
            .map(|(i, (start_quarter, quarters))| {
                let start = at(1, 0, 0) + Duration::minutes(start_quarter * 15);
                let end = (start + Duration::minutes(quarters * 15)).min(at(2, 0, 0));
                EventOccurrence::new(format!("e{}", i), "event", start, end).unwrap()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_overlapping_blocks_never_share_horizontal_space(events in monday_events()) {
        let blocks = layout_day(&events, week_start() + Duration::days(1), 0, &grid());
        prop_assert_eq!(blocks.len(), events.len());

        for (i, a) in blocks.iter().enumerate() {
            prop_assert!(a.slot < a.slot_count);
            for b in &blocks[i + 1..] {
                let overlap_in_time = a.occurrence.start.instant < b.occurrence.end.instant
                    && b.occurrence.start.instant < a.occurrence.end.instant;
                if overlap_in_time {
                    let a_left = a.left_fraction();
                    let b_left = b.left_fraction();
                    let disjoint = a_left + a.width_fraction() <= b_left + 1e-6
                        || b_left + b.width_fraction() <= a_left + 1e-6;
                    prop_assert!(disjoint, "{} and {} overlap", a.occurrence.id, b.occurrence.id);
                }
            }
        }
    }

    #[test]
    fn prop_blocks_stay_inside_the_day(events in monday_events()) {
        let grid = grid();
        for block in layout_day(&events, week_start() + Duration::days(1), 0, &grid) {
            prop_assert!(block.top >= 0.0);
            prop_assert!(block.height >= grid.min_block_height());
            prop_assert!(block.bottom() <= grid.day_height() + 1e-3);
        }
    }

    #[test]
    fn prop_snap_is_idempotent(pixels in -200.0f32..2000.0, snap in prop::sample::select(vec![1u32, 5, 10, 15, 30, 60])) {
        let grid = TimeGrid::new(60.0, snap, Tz::UTC);
        let once = grid.snap(pixels);
        prop_assert!((grid.snap(once) - once).abs() < 1e-3);
        prop_assert!((once - pixels).abs() <= grid.snap_step() / 2.0 + 1e-3);
    }

    #[test]
    fn prop_clamped_start_keeps_event_inside_the_day(start in -3000i64..3000, duration in 0i64..=MINUTES_PER_DAY) {
        let clamped = clamp_start(start, duration);
        prop_assert!(clamped >= 0);
        prop_assert!(clamped + duration <= MINUTES_PER_DAY);
        if (0..=MINUTES_PER_DAY - duration).contains(&start) {
            prop_assert_eq!(clamped, start);
        }
    }

    #[test]
    fn prop_create_edges_honour_bounds_and_minimum(anchor in 0.0f32..1440.0, touched in -500.0f32..2000.0) {
        let grid = grid();
        let limits = CreateLimits::default();
        let anchor = grid.snap(anchor);

        for (top, bottom) in [
            initial_edges(anchor, &grid, &limits),
            grow_edges(anchor, touched, &grid, &limits),
        ] {
            prop_assert!(top >= 0.0);
            prop_assert!(bottom <= grid.day_height());
            prop_assert!(bottom - top >= 30.0 - 1e-3, "{}..{}", top, bottom);
        }
    }

    #[test]
    fn prop_released_drag_preserves_duration(
        start_quarter in 0i64..(22 * 4),
        quarters in 1i64..=8,
        dx in -250.0f32..250.0,
        dy in -1600.0f32..1600.0,
    ) {
        let start = at(1, 0, 0) + Duration::minutes(start_quarter * 15);
        let occurrence = EventOccurrence::new("a", "A", start, start + Duration::minutes(quarters * 15)).unwrap();
        let repository = OccurrenceRepository::with_occurrences(vec![occurrence.clone()]);
        let grid = grid();
        let days = week();
        let geometry = SessionGeometry { grid: &grid, days: &days, column_width: COLUMN_WIDTH };
        let block = layout_day(&[occurrence], days[1], 1, &grid).remove(0);

        let (state, _) = drag::transition(
            Default::default(),
            DragInput::LongPress { block, snapshot: repository.snapshot() },
            &geometry,
        );
        let (state, _) = drag::transition(state, DragInput::PointerMoved { translation: Vec2::new(dx, dy) }, &geometry);
        let (_, effects) = drag::transition(state, DragInput::Released, &geometry);

        for effect in effects {
            if let DragEffect::Commit(commit) = effect {
                let new_start = commit.patch.start.unwrap().instant;
                let new_end = commit.patch.end.unwrap().instant;
                prop_assert_eq!((new_end - new_start).num_minutes(), quarters * 15);
                prop_assert_eq!(new_start.timestamp() % (15 * 60), 0);
            }
        }
    }

    #[test]
    fn prop_week_band_rows_never_collide(
        spans in prop::collection::vec((0i64..7, 1i64..=7), 0..16),
        max_rows in 1usize..5,
    ) {
        let events: Vec<EventOccurrence> = spans
            .iter()
            .enumerate()
            .map(|(i, (first, days))| all_day(&format!("b{}", i), *first, *days))
            .collect();
        let band = layout_week_band(&events, &week(), max_rows, Tz::UTC);

        prop_assert!(band.row_count <= max_rows);
        for (i, a) in band.blocks.iter().enumerate() {
            prop_assert!(a.row < max_rows);
            prop_assert!(a.end_column < 7);
            for b in &band.blocks[i + 1..] {
                if a.row == b.row {
                    prop_assert!(a.end_column < b.start_column || b.end_column < a.start_column);
                }
            }
        }

        let shown: usize = band.blocks.iter().map(|block| block.span()).sum();
        let hidden: usize = band.overflow_per_day.iter().sum();
        let total: usize = events
            .iter()
            .map(|event| {
                week()
                    .iter()
                    .filter(|day| event.covers_day(**day, Tz::UTC))
                    .count()
            })
            .sum();
        prop_assert_eq!(shown + hidden, total);
    }
}

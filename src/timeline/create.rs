//! Drag-to-create session.
//!
//! A long press on empty grid space drops a default-length interval centred on
//! the snapped press position (the anchor). Dragging above the interval grows
//! the top edge, dragging below grows the bottom edge, and returning inside it
//! restores the default interval. Every state keeps at least the minimum
//! duration and stays inside the day.

use egui::Pos2;

use super::geometry::{SessionGeometry, TimeGrid};
use super::layout::{hit_test, PositionedBlock};
use crate::services::bridge::CreateRequest;

/// Duration rules for new intervals, in minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateLimits {
    pub default_minutes: u32,
    pub min_minutes: u32,
}

impl Default for CreateLimits {
    fn default() -> Self {
        Self {
            default_minutes: 60,
            min_minutes: 30,
        }
    }
}

impl CreateLimits {
    fn half_default_px(&self, grid: &TimeGrid) -> f32 {
        grid.minutes_to_pixels(self.default_minutes as f32) / 2.0
    }

    fn default_px(&self, grid: &TimeGrid) -> f32 {
        grid.minutes_to_pixels(self.default_minutes as f32)
    }

    /// Minimum span rounded up to whole snap steps so snapped edges can honour it.
    fn min_px(&self, grid: &TimeGrid) -> f32 {
        let step = grid.snap_step();
        let raw = grid.minutes_to_pixels(self.min_minutes as f32);
        ((raw / step).ceil() * step).min(grid.day_height())
    }
}

/// Snapped (top, bottom) of the default interval around `anchor`.
///
/// Near the start or end of the day the clamped edge is pinned and the other
/// edge is pushed out to keep the default span.
pub fn initial_edges(anchor: f32, grid: &TimeGrid, limits: &CreateLimits) -> (f32, f32) {
    let max = grid.day_height();
    let half = limits.half_default_px(grid);
    let span = limits.default_px(grid);

    let mut top = grid.snap(anchor - half);
    let mut bottom = grid.snap(anchor + half);

    if top < 0.0 {
        top = 0.0;
        bottom = grid.snap(span);
    }
    if bottom > max {
        bottom = max;
        top = grid.snap(max - span);
    }

    enforce_bounds(top, bottom, grid, limits)
}

/// Edge a draft is pulling, decided by where the pointer sits against the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthEdge {
    /// Pointer is inside the default interval
    None,
    Top,
    Bottom,
}

pub fn growth_edge(
    anchor: f32,
    touched: f32,
    grid: &TimeGrid,
    limits: &CreateLimits,
) -> GrowthEdge {
    let half = limits.half_default_px(grid);
    if touched < anchor - half {
        GrowthEdge::Top
    } else if touched > anchor + half {
        GrowthEdge::Bottom
    } else {
        GrowthEdge::None
    }
}

/// Edges for the pointer at content y `touched`.
pub fn grow_edges(
    anchor: f32,
    touched: f32,
    grid: &TimeGrid,
    limits: &CreateLimits,
) -> (f32, f32) {
    let min = limits.min_px(grid);
    let (initial_top, initial_bottom) = initial_edges(anchor, grid, limits);

    let (top, bottom) = match growth_edge(anchor, touched, grid, limits) {
        GrowthEdge::Top => {
            let bottom = initial_bottom;
            let mut top = grid.snap(touched);
            if bottom - top < min {
                top = grid.snap(bottom - min);
            }
            (top, bottom)
        }
        GrowthEdge::Bottom => {
            let top = initial_top;
            let mut bottom = grid.snap(touched);
            if bottom - top < min {
                bottom = grid.snap(top + min);
            }
            (top, bottom)
        }
        GrowthEdge::None => (initial_top, initial_bottom),
    };

    enforce_bounds(top, bottom, grid, limits)
}

/// Clamp to the day, then restore the minimum span from whichever edge is free.
fn enforce_bounds(top: f32, bottom: f32, grid: &TimeGrid, limits: &CreateLimits) -> (f32, f32) {
    let max = grid.day_height();
    let min = limits.min_px(grid);
    let top = top.clamp(0.0, max);
    let bottom = bottom.clamp(0.0, max);

    if bottom - top >= min {
        return (top, bottom);
    }
    if top + min <= max {
        (top, top + min)
    } else {
        (max - min, max)
    }
}

/// Whether a press at `point` (content coordinates) lands on empty grid space.
pub fn can_start_at(point: Pos2, blocks: &[PositionedBlock], column_width: f32) -> bool {
    hit_test(blocks, point, column_width).is_none()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDraft {
    pub column: usize,
    /// Snapped press position, fixed for the session
    pub anchor: f32,
    /// Unsnapped press position
    pub gesture_start_y: f32,
    pub translation_y: f32,
    pub scroll_shift: f32,
    pub top: f32,
    pub bottom: f32,
    /// Set once the pointer has moved after the press
    pub panning: bool,
}

impl CreateDraft {
    pub fn touched(&self) -> f32 {
        self.gesture_start_y + self.translation_y + self.scroll_shift
    }

    pub fn growing(&self, grid: &TimeGrid, limits: &CreateLimits) -> GrowthEdge {
        growth_edge(self.anchor, self.touched(), grid, limits)
    }

    pub fn overlay(&self) -> CreateOverlay {
        CreateOverlay {
            column: self.column,
            top: self.top,
            bottom: self.bottom,
        }
    }

    /// Request for the current edges on the draft's day.
    pub fn request(&self, geometry: &SessionGeometry) -> Option<CreateRequest> {
        let grid = geometry.grid;
        let day = *geometry.days.get(self.column)?;
        Some(CreateRequest {
            day,
            start: grid.instant_at(day, grid.pixels_to_minutes(self.top)),
            end: grid.instant_at(day, grid.pixels_to_minutes(self.bottom)),
            time_zone: grid.time_zone,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateOverlay {
    pub column: usize,
    pub top: f32,
    pub bottom: f32,
}

impl CreateOverlay {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CreateState {
    #[default]
    Idle,
    Active(CreateDraft),
}

impl CreateState {
    pub fn is_active(&self) -> bool {
        matches!(self, CreateState::Active(_))
    }

    pub fn draft(&self) -> Option<&CreateDraft> {
        match self {
            CreateState::Active(draft) => Some(draft),
            CreateState::Idle => None,
        }
    }

    pub fn overlay(&self) -> Option<CreateOverlay> {
        self.draft().map(CreateDraft::overlay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateInput {
    /// Long press on empty space at `point` (content coordinates)
    Start { point: Pos2 },
    /// Cumulative vertical pointer travel since the press
    PointerMoved { translation_y: f32 },
    AutoScrolled { delta: f32 },
    Released,
    /// Gesture ended without a clean release
    Finalized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateEffect {
    Engaged,
    ShowOverlay(CreateOverlay),
    MoveOverlay(CreateOverlay),
    Tick,
    HideOverlay,
    Emit(CreateRequest),
}

pub fn transition(
    state: CreateState,
    input: CreateInput,
    geometry: &SessionGeometry,
    limits: &CreateLimits,
) -> (CreateState, Vec<CreateEffect>) {
    let grid = geometry.grid;

    match (state, input) {
        (CreateState::Idle, CreateInput::Start { point }) => {
            if geometry.days.is_empty() {
                return (CreateState::Idle, Vec::new());
            }
            let anchor = grid.snap(point.y).clamp(0.0, grid.day_height());
            let (top, bottom) = initial_edges(anchor, grid, limits);
            let draft = CreateDraft {
                column: geometry.column_at(point.x),
                anchor,
                gesture_start_y: point.y,
                translation_y: 0.0,
                scroll_shift: 0.0,
                top,
                bottom,
                panning: false,
            };
            log::debug!(
                "Create started in column {} at {:.0}px ({:.0}..{:.0})",
                draft.column,
                anchor,
                top,
                bottom
            );
            let overlay = draft.overlay();
            (
                CreateState::Active(draft),
                vec![CreateEffect::Engaged, CreateEffect::ShowOverlay(overlay)],
            )
        }

        (CreateState::Active(mut draft), CreateInput::PointerMoved { translation_y }) => {
            draft.panning = true;
            draft.translation_y = translation_y;
            let effects = regrow(&mut draft, grid, limits);
            (CreateState::Active(draft), effects)
        }

        (CreateState::Active(mut draft), CreateInput::AutoScrolled { delta }) => {
            draft.scroll_shift += delta;
            let effects = regrow(&mut draft, grid, limits);
            (CreateState::Active(draft), effects)
        }

        (CreateState::Active(draft), CreateInput::Released | CreateInput::Finalized) => {
            let mut effects = vec![CreateEffect::HideOverlay];
            match draft.request(geometry) {
                Some(request) => {
                    log::info!(
                        "Create requested on {} from {} to {}",
                        request.day,
                        request.start,
                        request.end
                    );
                    effects.push(CreateEffect::Emit(request));
                }
                None => log::warn!("Create ended over column {} with no day", draft.column),
            }
            (CreateState::Idle, effects)
        }

        (state, _) => (state, Vec::new()),
    }
}

fn regrow(draft: &mut CreateDraft, grid: &TimeGrid, limits: &CreateLimits) -> Vec<CreateEffect> {
    let (top, bottom) = grow_edges(draft.anchor, draft.touched(), grid, limits);
    if top == draft.top && bottom == draft.bottom {
        return Vec::new();
    }
    draft.top = top;
    draft.bottom = bottom;
    vec![CreateEffect::Tick, CreateEffect::MoveOverlay(draft.overlay())]
}

//! Drag-to-move session.
//!
//! A long press on a draggable block arms the session and shows an overlay at
//! the block's snapped position. The session turns active only once the
//! pointer actually moves, so a press that is released in place stays a tap.
//! Release proposes a reschedule that the controller applies optimistically
//! and persists in the background.
//!
//! [`transition`] is pure: it takes the current state and one input and
//! returns the next state plus the effects the controller must carry out.

use egui::Vec2;

use super::geometry::{clamp_start, SessionGeometry, TimeGrid, MINUTES_PER_DAY};
use super::layout::PositionedBlock;
use crate::models::occurrence::{CalendarDate, EventOccurrence, OccurrencePatch};
use crate::services::repository::OccurrenceSnapshot;

/// Floating copy of the dragged block, in content coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct DragOverlay {
    pub occurrence_id: String,
    pub column: usize,
    pub top: f32,
    pub height: f32,
}

impl DragOverlay {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub occurrence: EventOccurrence,
    /// Snapped top of the block when the press armed
    pub origin_top: f32,
    pub origin_column: usize,
    pub height: f32,
    /// Pointer travel since the press
    pub translation: Vec2,
    /// Content scrolled under the pointer by auto-scroll since the press
    pub scroll_shift: f32,
    pub proposed_top: f32,
    pub proposed_column: usize,
    /// Occurrence list as it was when the press armed
    pub snapshot: OccurrenceSnapshot,
}

impl DragSession {
    fn arm(block: PositionedBlock, snapshot: OccurrenceSnapshot, grid: &TimeGrid) -> Self {
        let max_top = (grid.day_height() - block.height).max(0.0);
        let origin_top = grid.snap(block.top).clamp(0.0, max_top);
        Self {
            origin_top,
            origin_column: block.column,
            height: block.height,
            translation: Vec2::ZERO,
            scroll_shift: 0.0,
            proposed_top: origin_top,
            proposed_column: block.column,
            occurrence: block.occurrence,
            snapshot,
        }
    }

    pub fn overlay(&self) -> DragOverlay {
        DragOverlay {
            occurrence_id: self.occurrence.id.clone(),
            column: self.proposed_column,
            top: self.proposed_top,
            height: self.height,
        }
    }

    fn is_moved(&self) -> bool {
        self.proposed_top != self.origin_top || self.proposed_column != self.origin_column
    }

    /// Recompute the snapped proposal. Returns whether it changed.
    fn repropose(&mut self, geometry: &SessionGeometry) -> bool {
        let (top, column) = propose(self, geometry);
        let changed = top != self.proposed_top || column != self.proposed_column;
        self.proposed_top = top;
        self.proposed_column = column;
        changed
    }
}

/// Lowest top the overlay may take. Bounded by the drawn height and by the
/// full duration, so a block clipped at midnight lands where it is shown.
fn max_top(occurrence: &EventOccurrence, height: f32, grid: &TimeGrid) -> f32 {
    let by_height = grid.day_height() - height;
    let latest_start = clamp_start(MINUTES_PER_DAY, occurrence.duration_minutes());
    let by_duration = grid.minutes_to_pixels(latest_start as f32);
    by_height.min(by_duration).max(0.0)
}

/// Snapped top and day column under the current pointer position.
pub fn propose(session: &DragSession, geometry: &SessionGeometry) -> (f32, usize) {
    let grid = geometry.grid;
    let max_top = max_top(&session.occurrence, session.height, grid);
    let raw_top = session.origin_top + session.translation.y + session.scroll_shift;
    let top = grid.snap(raw_top).clamp(0.0, max_top);

    let column = if geometry.column_count() > 1 {
        let width = geometry.column_width;
        let centre = session.origin_column as f32 * width + session.translation.x + width / 2.0;
        geometry.column_at(centre)
    } else {
        session.origin_column
    };

    (top, column)
}

/// A released move waiting to be applied and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCommit {
    pub occurrence_id: String,
    pub patch: OccurrencePatch,
    pub snapshot: OccurrenceSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Armed(DragSession),
    Active(DragSession),
    Committing(MoveCommit),
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    /// True while a session owns the pointer.
    pub fn is_engaged(&self) -> bool {
        matches!(self, DragState::Armed(_) | DragState::Active(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragState::Armed(session) | DragState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<DragOverlay> {
        self.session().map(DragSession::overlay)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragInput {
    LongPress {
        block: PositionedBlock,
        snapshot: OccurrenceSnapshot,
    },
    /// Cumulative pointer travel since the press
    PointerMoved { translation: Vec2 },
    /// Auto-scroll moved the content by `delta` pixels
    AutoScrolled { delta: f32 },
    Released,
    Cancelled,
    /// The controller applied and queued the commit
    CommitDispatched,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    ShowOverlay(DragOverlay),
    MoveOverlay(DragOverlay),
    HideOverlay,
    /// Snapped position crossed a grid line
    Tick,
    /// Session armed under the finger
    Engaged,
    Commit(MoveCommit),
    Restore(OccurrenceSnapshot),
}

pub fn transition(
    state: DragState,
    input: DragInput,
    geometry: &SessionGeometry,
) -> (DragState, Vec<DragEffect>) {
    match (state, input) {
        (DragState::Idle, DragInput::LongPress { block, snapshot }) => {
            if !block.is_draggable() {
                log::debug!(
                    "Ignoring long press on non-draggable occurrence '{}'",
                    block.occurrence.id
                );
                return (DragState::Idle, Vec::new());
            }
            let session = DragSession::arm(block, snapshot, geometry.grid);
            log::debug!("Drag armed for '{}'", session.occurrence.id);
            let overlay = session.overlay();
            (
                DragState::Armed(session),
                vec![DragEffect::Engaged, DragEffect::ShowOverlay(overlay)],
            )
        }

        (DragState::Armed(mut session), DragInput::PointerMoved { translation }) => {
            if translation == Vec2::ZERO {
                return (DragState::Armed(session), Vec::new());
            }
            session.translation = translation;
            let effects = moved_effects(&mut session, geometry);
            log::debug!("Drag active for '{}'", session.occurrence.id);
            (DragState::Active(session), effects)
        }

        (DragState::Active(mut session), DragInput::PointerMoved { translation }) => {
            session.translation = translation;
            let effects = moved_effects(&mut session, geometry);
            (DragState::Active(session), effects)
        }

        (DragState::Active(mut session), DragInput::AutoScrolled { delta }) => {
            session.scroll_shift += delta;
            let effects = moved_effects(&mut session, geometry);
            (DragState::Active(session), effects)
        }

        // Never moved: a tap, not a drag
        (DragState::Armed(_), DragInput::Released | DragInput::Cancelled) => {
            (DragState::Idle, vec![DragEffect::HideOverlay])
        }

        (DragState::Active(session), DragInput::Released) => release(session, geometry),

        // Nothing has been applied before release, so there is nothing to restore
        (DragState::Active(session), DragInput::Cancelled) => {
            log::debug!("Drag cancelled for '{}'", session.occurrence.id);
            (DragState::Idle, vec![DragEffect::HideOverlay])
        }

        (DragState::Committing(commit), DragInput::Cancelled) => {
            log::warn!(
                "Move of '{}' cancelled before dispatch, restoring snapshot",
                commit.occurrence_id
            );
            (DragState::Idle, vec![DragEffect::Restore(commit.snapshot)])
        }

        (DragState::Committing(_), DragInput::CommitDispatched) => (DragState::Idle, Vec::new()),

        (state, _) => (state, Vec::new()),
    }
}

fn moved_effects(session: &mut DragSession, geometry: &SessionGeometry) -> Vec<DragEffect> {
    if session.repropose(geometry) {
        vec![DragEffect::Tick, DragEffect::MoveOverlay(session.overlay())]
    } else {
        Vec::new()
    }
}

fn release(session: DragSession, geometry: &SessionGeometry) -> (DragState, Vec<DragEffect>) {
    if !session.is_moved() {
        log::debug!(
            "Drag of '{}' released at its origin, nothing to commit",
            session.occurrence.id
        );
        return (DragState::Idle, vec![DragEffect::HideOverlay]);
    }

    let Some(day) = geometry.days.get(session.proposed_column).copied() else {
        log::warn!(
            "Drag of '{}' released over column {} with {} days visible",
            session.occurrence.id,
            session.proposed_column,
            geometry.days.len()
        );
        return (DragState::Idle, vec![DragEffect::HideOverlay]);
    };

    let occurrence = &session.occurrence;
    let grid = geometry.grid;
    let start_minutes = clamp_start(
        grid.pixels_to_minutes(session.proposed_top),
        occurrence.duration_minutes(),
    );
    let start = grid.instant_at(day, start_minutes);
    let end = start + occurrence.duration();

    let patch = OccurrencePatch::reschedule(
        CalendarDate::timed(start, occurrence.start.time_zone),
        CalendarDate::timed(end, occurrence.end.time_zone),
    );

    log::info!(
        "Moving '{}' to {} ({} min)",
        occurrence.id,
        start,
        occurrence.duration_minutes()
    );

    let commit = MoveCommit {
        occurrence_id: occurrence.id.clone(),
        patch,
        snapshot: session.snapshot,
    };
    (
        DragState::Committing(commit.clone()),
        vec![DragEffect::HideOverlay, DragEffect::Commit(commit)],
    )
}

//! Orchestrates one timeline screen.
//!
//! The controller owns the occurrence repository, the cached block layout,
//! both gesture sessions, the scroll state and the commit queue. The renderer
//! feeds it pointer events in viewport coordinates and calls [`tick`] once per
//! frame; it reads back blocks, the published [`TimelineFrame`] and a queue of
//! [`TimelineSignal`]s.
//!
//! [`tick`]: TimelineController::tick

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use egui::Pos2;

use super::auto_scroll::{AutoScroller, EdgeProbe, ScrollState};
use super::create::{
    self, CreateEffect, CreateInput, CreateLimits, CreateOverlay, CreateState, GrowthEdge,
};
use super::drag::{self, DragEffect, DragInput, DragOverlay, DragState};
use super::geometry::{SessionGeometry, TimeGrid};
use super::layout::{hit_test, layout_days, PositionedBlock};
use super::observable::{Observable, SubscriptionId};
use super::week_band::{layout_week_band, WeekBandLayout};
use crate::models::date_range::DateRange;
use crate::models::occurrence::EventOccurrence;
use crate::models::settings::TimelineSettings;
use crate::services::bridge::{BridgeError, CalendarBridge, CreateRequest};
use crate::services::commit::{CommitOutcome, CommitQueue, CommitTicket};
use crate::services::repository::{OccurrenceRepository, OccurrenceSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticFeedback {
    /// A session started
    Medium,
    /// A snapped edge crossed a grid line
    Light,
}

/// Things the surrounding screen may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineSignal {
    Haptic(HapticFeedback),
    EventTapped { occurrence_id: String },
    CreateRequested(CreateRequest),
    CommitSucceeded { occurrence_id: String },
    CommitRolledBack {
        occurrence_id: String,
        error: BridgeError,
    },
}

/// Pointer input, positions relative to the top-left of the first day column
/// in the visible viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Pressed(Pos2),
    Moved(Pos2),
    Released,
    /// The platform took the pointer away
    Cancelled,
}

/// Everything the renderer reads together each frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineFrame {
    pub scroll_offset: f32,
    pub drag_overlay: Option<DragOverlay>,
    pub create_overlay: Option<CreateOverlay>,
}

impl TimelineFrame {
    /// Occurrence currently being dragged, drawn dimmed in place.
    pub fn dragged_id(&self) -> Option<&str> {
        self.drag_overlay
            .as_ref()
            .map(|overlay| overlay.occurrence_id.as_str())
    }
}

#[derive(Debug, Clone)]
enum PressTarget {
    Block(PositionedBlock),
    Empty,
}

#[derive(Debug, Clone)]
struct PendingPress {
    origin: Pos2,
    pressed_at: Instant,
    target: PressTarget,
    /// Moved past the slop before the long press fired
    scrolling: bool,
    /// A session took over the press
    engaged: bool,
}

pub struct TimelineController {
    settings: TimelineSettings,
    grid: TimeGrid,
    limits: CreateLimits,
    days: Vec<NaiveDate>,
    column_width: f32,
    calendar_ids: Vec<String>,
    repository: OccurrenceRepository,
    blocks: Vec<PositionedBlock>,
    blocks_revision: Option<u64>,
    drag: DragState,
    create: CreateState,
    press: Option<PendingPress>,
    drag_overlay: Option<DragOverlay>,
    create_overlay: Option<CreateOverlay>,
    scroll: ScrollState,
    scroller: AutoScroller,
    last_frame: Option<Instant>,
    frame: Observable<TimelineFrame>,
    bridge: Arc<dyn CalendarBridge>,
    commits: CommitQueue,
    pending_rollbacks: HashMap<CommitTicket, OccurrenceSnapshot>,
    signals: Vec<TimelineSignal>,
}

impl TimelineController {
    pub fn new(settings: TimelineSettings, bridge: Arc<dyn CalendarBridge>) -> Self {
        let grid = settings.grid();
        Self {
            limits: CreateLimits {
                default_minutes: settings.default_create_minutes,
                min_minutes: settings.min_create_minutes,
            },
            days: Vec::new(),
            column_width: 0.0,
            calendar_ids: Vec::new(),
            repository: OccurrenceRepository::new(),
            blocks: Vec::new(),
            blocks_revision: None,
            drag: DragState::Idle,
            create: CreateState::Idle,
            press: None,
            drag_overlay: None,
            create_overlay: None,
            scroll: ScrollState::new(0.0, grid.day_height()),
            scroller: AutoScroller::new(settings.edge_threshold, settings.scroll_speed_px_per_sec),
            last_frame: None,
            frame: Observable::default(),
            bridge,
            commits: CommitQueue::new(Duration::from_millis(settings.commit_timeout_ms)),
            pending_rollbacks: HashMap::new(),
            signals: Vec::new(),
            grid,
            settings,
        }
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    pub fn repository(&self) -> &OccurrenceRepository {
        &self.repository
    }

    pub fn occurrences(&self) -> &[EventOccurrence] {
        self.repository.all()
    }

    /// Change the visible day columns. An active session resolves first.
    pub fn set_days(&mut self, days: Vec<NaiveDate>) {
        if days == self.days {
            return;
        }
        self.end_sessions();
        self.days = days;
        self.blocks_revision = None;
        self.publish();
    }

    pub fn set_column_width(&mut self, column_width: f32) {
        self.column_width = column_width.max(0.0);
    }

    pub fn set_viewport_height(&mut self, viewport_height: f32) {
        self.scroll.resize(viewport_height, self.grid.day_height());
        self.publish();
    }

    /// Restrict loads to these calendars; empty means all.
    pub fn set_calendar_filter(&mut self, calendar_ids: Vec<String>) {
        self.calendar_ids = calendar_ids;
    }

    /// Replace the occurrence list with what the store has for `range`.
    pub fn load(&mut self, range: &DateRange) -> Result<usize> {
        let occurrences = self.fetch(range)?;
        let count = occurrences.len();
        self.repository.replace_all(occurrences);
        log::info!("Loaded {} occurrences for {}..{}", count, range.start, range.end);
        Ok(count)
    }

    /// Merge a further range into the loaded occurrences.
    pub fn load_more(&mut self, range: &DateRange) -> Result<usize> {
        let occurrences = self.fetch(range)?;
        let count = occurrences.len();
        self.repository.append(occurrences);
        log::debug!("Appended {} occurrences for {}..{}", count, range.start, range.end);
        Ok(count)
    }

    fn fetch(&self, range: &DateRange) -> Result<Vec<EventOccurrence>> {
        self.bridge
            .fetch_occurrences(range, &self.calendar_ids)
            .with_context(|| format!("Failed to fetch occurrences for {}..{}", range.start, range.end))
    }

    /// Positioned blocks for the visible days, recomputed when the data changed.
    pub fn blocks(&mut self) -> &[PositionedBlock] {
        let revision = self.repository.revision();
        if self.blocks_revision != Some(revision) {
            self.blocks = layout_days(self.repository.all(), &self.days, &self.grid);
            self.blocks_revision = Some(revision);
        }
        &self.blocks
    }

    /// All-day and multi-day strip above the visible columns.
    pub fn week_band(&self) -> WeekBandLayout {
        let band_items: Vec<EventOccurrence> = self
            .repository
            .all()
            .iter()
            .filter(|occurrence| {
                occurrence.is_all_day() || occurrence.spans_multiple_days(self.grid.time_zone)
            })
            .cloned()
            .collect();
        layout_week_band(
            &band_items,
            &self.days,
            self.settings.week_band_max_rows,
            self.grid.time_zone,
        )
    }

    pub fn frame(&self) -> &TimelineFrame {
        self.frame.get()
    }

    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&TimelineFrame) + Send + 'static,
    ) -> SubscriptionId {
        self.frame.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.frame.unsubscribe(id)
    }

    pub fn drain_signals(&mut self) -> Vec<TimelineSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Whether the viewport may scroll under the user's own input.
    pub fn scroll_enabled(&self) -> bool {
        !self.drag.is_engaged() && !self.create.is_active()
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.scroller.is_scrolling()
    }

    /// Commits sent to the store and not yet answered.
    pub fn pending_commits(&self) -> usize {
        self.commits.pending()
    }

    /// User scroll. Ignored while a session holds the pointer.
    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        if !self.scroll_enabled() {
            return 0.0;
        }
        let applied = self.scroll.scroll_by(delta);
        self.publish();
        applied
    }

    pub fn scroll_to(&mut self, offset: f32) {
        if self.scroll_enabled() {
            self.scroll.set_offset(offset);
            self.publish();
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) {
        match event {
            PointerEvent::Pressed(position) => self.on_pressed(position, now),
            PointerEvent::Moved(position) => {
                self.check_long_press(now);
                self.on_moved(position);
            }
            PointerEvent::Released => {
                self.check_long_press(now);
                self.on_released();
            }
            PointerEvent::Cancelled => self.on_cancelled(),
        }
        self.publish();
    }

    /// Per-frame work: long-press detection, commit results and auto-scroll.
    pub fn tick(&mut self, now: Instant) {
        self.check_long_press(now);

        let outcomes = self.commits.poll(now);
        self.resolve_commits(outcomes);

        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);
        self.auto_scroll(dt);

        self.publish();
    }

    /// Block until in-flight commits settle or `limit` passes, then resolve them.
    pub fn flush_commits(&mut self, limit: Duration) {
        let outcomes = self.commits.drain_blocking(limit);
        self.resolve_commits(outcomes);
        self.publish();
    }

    fn on_pressed(&mut self, position: Pos2, now: Instant) {
        if self.press.is_some() || !self.scroll_enabled() {
            log::debug!("Ignoring press while another gesture owns the pointer");
            return;
        }

        let content = self.to_content(position);
        let column_width = self.column_width;
        let target = match hit_test(self.blocks(), content, column_width) {
            Some(block) => PressTarget::Block(block.clone()),
            None => PressTarget::Empty,
        };

        self.press = Some(PendingPress {
            origin: position,
            pressed_at: now,
            target,
            scrolling: false,
            engaged: false,
        });
    }

    fn on_moved(&mut self, position: Pos2) {
        let slop = self.settings.press_slop;
        let Some(press) = self.press.as_mut() else {
            return;
        };

        let translation = position - press.origin;
        if !press.engaged {
            if !press.scrolling && translation.length() > slop {
                press.scrolling = true;
            }
            return;
        }

        if self.drag.is_engaged() {
            self.drive_drag(DragInput::PointerMoved { translation });
        } else if self.create.is_active() {
            self.drive_create(CreateInput::PointerMoved {
                translation_y: translation.y,
            });
        }
    }

    fn on_released(&mut self) {
        let Some(press) = self.press.take() else {
            return;
        };

        if press.engaged {
            if self.drag.is_engaged() {
                self.drive_drag(DragInput::Released);
            }
            if self.create.is_active() {
                self.drive_create(CreateInput::Released);
            }
        } else if !press.scrolling {
            if let PressTarget::Block(block) = press.target {
                self.signals.push(TimelineSignal::EventTapped {
                    occurrence_id: block.occurrence.id,
                });
            }
        }
        self.scroller.stop();
    }

    fn on_cancelled(&mut self) {
        self.press = None;
        self.end_sessions();
    }

    /// Resolve whatever session is running: drags cancel, creates still emit.
    fn end_sessions(&mut self) {
        if self.drag.is_engaged() {
            self.drive_drag(DragInput::Cancelled);
        }
        if self.create.is_active() {
            self.drive_create(CreateInput::Finalized);
        }
        self.press = None;
        self.scroller.stop();
    }

    fn check_long_press(&mut self, now: Instant) {
        let delay = Duration::from_millis(self.settings.long_press_ms);
        let Some(press) = self.press.as_ref() else {
            return;
        };
        if press.engaged
            || press.scrolling
            || now.saturating_duration_since(press.pressed_at) < delay
        {
            return;
        }

        let origin = self.to_content(press.origin);
        match press.target.clone() {
            PressTarget::Block(block) => {
                let snapshot = self.repository.snapshot();
                self.drive_drag(DragInput::LongPress { block, snapshot });
                if self.drag.is_engaged() {
                    self.mark_engaged();
                }
            }
            PressTarget::Empty => {
                let column_width = self.column_width;
                if create::can_start_at(origin, self.blocks(), column_width) {
                    self.drive_create(CreateInput::Start { point: origin });
                    if self.create.is_active() {
                        self.mark_engaged();
                    }
                }
            }
        }
    }

    fn mark_engaged(&mut self) {
        if let Some(press) = self.press.as_mut() {
            press.engaged = true;
        }
    }

    fn drive_drag(&mut self, input: DragInput) {
        let state = std::mem::take(&mut self.drag);
        let (next, effects) = {
            let geometry = SessionGeometry {
                grid: &self.grid,
                days: &self.days,
                column_width: self.column_width,
            };
            drag::transition(state, input, &geometry)
        };
        self.drag = next;

        for effect in effects {
            match effect {
                DragEffect::Engaged => self.haptic(HapticFeedback::Medium),
                DragEffect::Tick => self.haptic(HapticFeedback::Light),
                DragEffect::ShowOverlay(overlay) | DragEffect::MoveOverlay(overlay) => {
                    self.drag_overlay = Some(overlay);
                }
                DragEffect::HideOverlay => self.drag_overlay = None,
                DragEffect::Commit(commit) => {
                    match self.repository.apply(&commit.occurrence_id, &commit.patch) {
                        Ok(()) => {
                            let ticket = self.commits.submit(
                                Arc::clone(&self.bridge),
                                &commit.occurrence_id,
                                commit.patch,
                                Instant::now(),
                            );
                            self.pending_rollbacks.insert(ticket, commit.snapshot);
                            self.drive_drag(DragInput::CommitDispatched);
                        }
                        Err(e) => {
                            log::warn!("Could not apply move locally: {:#}", e);
                            self.drive_drag(DragInput::Cancelled);
                            self.signals.push(TimelineSignal::CommitRolledBack {
                                occurrence_id: commit.occurrence_id,
                                error: BridgeError::Rejected(format!("{:#}", e)),
                            });
                        }
                    }
                }
                DragEffect::Restore(snapshot) => self.repository.rollback(snapshot),
            }
        }
    }

    fn drive_create(&mut self, input: CreateInput) {
        let state = std::mem::take(&mut self.create);
        let (next, effects) = {
            let geometry = SessionGeometry {
                grid: &self.grid,
                days: &self.days,
                column_width: self.column_width,
            };
            create::transition(state, input, &geometry, &self.limits)
        };
        self.create = next;

        for effect in effects {
            match effect {
                CreateEffect::Engaged => self.haptic(HapticFeedback::Medium),
                CreateEffect::Tick => self.haptic(HapticFeedback::Light),
                CreateEffect::ShowOverlay(overlay) | CreateEffect::MoveOverlay(overlay) => {
                    self.create_overlay = Some(overlay);
                }
                CreateEffect::HideOverlay => self.create_overlay = None,
                CreateEffect::Emit(request) => {
                    if let Err(e) = self.bridge.request_create_occurrence(&request) {
                        log::error!("Create request was not delivered: {}", e);
                    }
                    self.signals.push(TimelineSignal::CreateRequested(request));
                }
            }
        }
    }

    fn resolve_commits(&mut self, outcomes: Vec<CommitOutcome>) {
        for outcome in outcomes {
            let snapshot = self.pending_rollbacks.remove(&outcome.ticket);
            match outcome.result {
                Ok(()) => {
                    log::info!("Move of '{}' saved", outcome.occurrence_id);
                    self.signals.push(TimelineSignal::CommitSucceeded {
                        occurrence_id: outcome.occurrence_id,
                    });
                }
                Err(error) => {
                    log::warn!(
                        "Move of '{}' failed ({}), rolling back",
                        outcome.occurrence_id,
                        error
                    );
                    if let Some(snapshot) = snapshot {
                        self.repository.rollback(snapshot);
                    }
                    self.signals.push(TimelineSignal::CommitRolledBack {
                        occurrence_id: outcome.occurrence_id,
                        error,
                    });
                }
            }
        }
    }

    fn auto_scroll(&mut self, dt: Duration) {
        let probe = match (&self.drag, &self.create) {
            (DragState::Active(session), _) => Some(EdgeProbe::for_move(session.proposed_top)),
            (_, CreateState::Active(draft)) if draft.panning => {
                match draft.growing(&self.grid, &self.limits) {
                    GrowthEdge::Top => Some(EdgeProbe::growing_top(draft.top)),
                    GrowthEdge::Bottom => Some(EdgeProbe::growing_bottom(draft.bottom)),
                    GrowthEdge::None => None,
                }
            }
            _ => None,
        };

        self.scroller.observe(probe, &self.scroll);
        let delta = self.scroller.advance(dt, &mut self.scroll);
        if delta == 0.0 {
            return;
        }

        if self.drag.is_engaged() {
            self.drive_drag(DragInput::AutoScrolled { delta });
        } else if self.create.is_active() {
            self.drive_create(CreateInput::AutoScrolled { delta });
        }
    }

    fn haptic(&mut self, feedback: HapticFeedback) {
        self.signals.push(TimelineSignal::Haptic(feedback));
    }

    fn to_content(&self, viewport: Pos2) -> Pos2 {
        Pos2::new(viewport.x, self.scroll.to_content(viewport.y))
    }

    /// Write scroll offset and overlays as one value.
    fn publish(&mut self) {
        self.frame.set(TimelineFrame {
            scroll_offset: self.scroll.offset(),
            drag_overlay: self.drag_overlay.clone(),
            create_overlay: self.create_overlay,
        });
    }
}

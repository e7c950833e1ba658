//! Edge auto-scroll while a gesture session is active.
//!
//! [`AutoScroller::observe`] picks a direction from where the overlay sits in
//! the viewport; [`AutoScroller::advance`] moves the scroll offset once per
//! frame at a fixed speed in pixels per second and returns the applied delta,
//! which the caller feeds back into the session so the overlay stays under
//! the pointer.

use std::time::Duration;

/// Longest frame step honoured; a stalled frame must not jump the grid.
const MAX_FRAME_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    #[default]
    None,
    Up,
    Down,
}

/// Scroll position of the time viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollState {
    offset: f32,
    viewport_height: f32,
    content_height: f32,
}

impl ScrollState {
    pub fn new(viewport_height: f32, content_height: f32) -> Self {
        Self {
            offset: 0.0,
            viewport_height: viewport_height.max(0.0),
            content_height: content_height.max(0.0),
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    /// Set the offset, clamped. Returns the delta actually applied.
    pub fn set_offset(&mut self, offset: f32) -> f32 {
        let clamped = if offset.is_finite() {
            offset.clamp(0.0, self.max_offset())
        } else {
            self.offset
        };
        let delta = clamped - self.offset;
        self.offset = clamped;
        delta
    }

    pub fn scroll_by(&mut self, delta: f32) -> f32 {
        self.set_offset(self.offset + delta)
    }

    pub fn resize(&mut self, viewport_height: f32, content_height: f32) {
        self.viewport_height = viewport_height.max(0.0);
        self.content_height = content_height.max(0.0);
        self.set_offset(self.offset);
    }

    pub fn to_viewport(&self, content_y: f32) -> f32 {
        content_y - self.offset
    }

    pub fn to_content(&self, viewport_y: f32) -> f32 {
        viewport_y + self.offset
    }
}

/// The overlay edges the scroller watches, in content coordinates.
/// An edge left as `None` never triggers a scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeProbe {
    pub top: Option<f32>,
    pub bottom: Option<f32>,
}

impl EdgeProbe {
    /// A moved block scrolls on its top edge in both directions.
    pub fn for_move(top: f32) -> Self {
        Self {
            top: Some(top),
            bottom: Some(top),
        }
    }

    /// A create draft growing upwards only scrolls up.
    pub fn growing_top(top: f32) -> Self {
        Self {
            top: Some(top),
            bottom: None,
        }
    }

    pub fn growing_bottom(bottom: f32) -> Self {
        Self {
            top: None,
            bottom: Some(bottom),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoScroller {
    direction: ScrollDirection,
    edge_threshold: f32,
    speed: f32,
}

impl AutoScroller {
    pub fn new(edge_threshold: f32, speed_px_per_sec: f32) -> Self {
        Self {
            direction: ScrollDirection::None,
            edge_threshold,
            speed: speed_px_per_sec,
        }
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn is_scrolling(&self) -> bool {
        self.direction != ScrollDirection::None
    }

    /// Update the direction. `None` means no session is panning.
    pub fn observe(&mut self, probe: Option<EdgeProbe>, scroll: &ScrollState) -> ScrollDirection {
        let direction = match probe {
            None => ScrollDirection::None,
            Some(probe) => {
                let lower_limit = scroll.viewport_height() - self.edge_threshold;
                let near_top = probe
                    .top
                    .is_some_and(|top| scroll.to_viewport(top) < self.edge_threshold);
                let near_bottom = probe
                    .bottom
                    .is_some_and(|bottom| scroll.to_viewport(bottom) > lower_limit);
                if near_top {
                    ScrollDirection::Up
                } else if near_bottom {
                    ScrollDirection::Down
                } else {
                    ScrollDirection::None
                }
            }
        };

        if direction != self.direction {
            log::debug!("Auto-scroll {:?} -> {:?}", self.direction, direction);
            self.direction = direction;
        }
        direction
    }

    /// Scroll for one frame of length `dt`. Returns the applied delta.
    pub fn advance(&self, dt: Duration, scroll: &mut ScrollState) -> f32 {
        let step = self.speed * dt.min(MAX_FRAME_STEP).as_secs_f32();
        match self.direction {
            ScrollDirection::None => 0.0,
            ScrollDirection::Up => scroll.scroll_by(-step),
            ScrollDirection::Down => scroll.scroll_by(step),
        }
    }

    pub fn stop(&mut self) {
        if self.direction != ScrollDirection::None {
            log::debug!("Auto-scroll stopped");
        }
        self.direction = ScrollDirection::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroll_at(offset: f32) -> ScrollState {
        let mut scroll = ScrollState::new(600.0, 1440.0);
        scroll.set_offset(offset);
        scroll
    }

    #[test]
    fn test_offset_is_clamped() {
        let mut scroll = ScrollState::new(600.0, 1440.0);
        assert_eq!(scroll.scroll_by(-50.0), 0.0);
        assert_eq!(scroll.set_offset(2000.0), 840.0);
        assert_eq!(scroll.offset(), 840.0);
        assert_eq!(scroll.set_offset(f32::NAN), 0.0);
    }

    #[test]
    fn test_short_content_cannot_scroll() {
        let mut scroll = ScrollState::new(800.0, 400.0);
        assert_eq!(scroll.max_offset(), 0.0);
        assert_eq!(scroll.scroll_by(100.0), 0.0);
    }

    #[test]
    fn test_direction_from_edges() {
        let mut scroller = AutoScroller::new(60.0, 600.0);
        let scroll = scroll_at(300.0);

        assert_eq!(
            scroller.observe(Some(EdgeProbe::for_move(320.0)), &scroll),
            ScrollDirection::Up
        );
        assert_eq!(
            scroller.observe(Some(EdgeProbe::for_move(600.0)), &scroll),
            ScrollDirection::None
        );
        assert_eq!(
            scroller.observe(Some(EdgeProbe::for_move(850.0)), &scroll),
            ScrollDirection::Down
        );
        assert_eq!(
            scroller.observe(Some(EdgeProbe::growing_bottom(860.0)), &scroll),
            ScrollDirection::Down
        );
        assert_eq!(
            scroller.observe(Some(EdgeProbe::growing_top(310.0)), &scroll),
            ScrollDirection::Up
        );
        assert_eq!(scroller.observe(None, &scroll), ScrollDirection::None);
    }

    #[test]
    fn test_create_probe_ignores_the_fixed_edge() {
        let mut scroller = AutoScroller::new(60.0, 600.0);
        let scroll = scroll_at(300.0);

        // Top sits in the upper band but only the bottom is moving
        assert_eq!(
            scroller.observe(Some(EdgeProbe::growing_bottom(585.0)), &scroll),
            ScrollDirection::None
        );
        assert_eq!(
            scroller.observe(Some(EdgeProbe::growing_top(860.0)), &scroll),
            ScrollDirection::None
        );
    }

    #[test]
    fn test_advance_is_frame_rate_independent() {
        let mut scroller = AutoScroller::new(60.0, 600.0);
        let mut fast = scroll_at(300.0);
        let mut slow = scroll_at(300.0);
        scroller.observe(Some(EdgeProbe::for_move(860.0)), &fast);

        for _ in 0..6 {
            scroller.advance(Duration::from_micros(16_667), &mut fast);
        }
        scroller.advance(Duration::from_millis(100), &mut slow);

        assert!((fast.offset() - slow.offset()).abs() < 0.5);
        assert!((slow.offset() - 360.0).abs() < 0.01);
    }

    #[test]
    fn test_advance_stops_at_bounds() {
        let mut scroller = AutoScroller::new(60.0, 600.0);
        let mut scroll = scroll_at(5.0);
        scroller.observe(Some(EdgeProbe::for_move(10.0)), &scroll);

        assert_eq!(scroller.advance(Duration::from_millis(50), &mut scroll), -5.0);
        assert_eq!(scroller.advance(Duration::from_millis(50), &mut scroll), 0.0);
    }

    #[test]
    fn test_idle_scroller_does_nothing() {
        let mut scroller = AutoScroller::new(60.0, 600.0);
        let mut scroll = scroll_at(300.0);
        scroller.observe(Some(EdgeProbe::for_move(320.0)), &scroll);
        scroller.stop();
        assert_eq!(scroller.advance(Duration::from_millis(16), &mut scroll), 0.0);
        assert_eq!(scroll.offset(), 300.0);
    }
}

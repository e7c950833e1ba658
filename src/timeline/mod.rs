//! The timeline core: grid geometry, overlap layout, week bands and the two
//! gesture sessions with their auto-scroll, tied together by the controller.

pub mod auto_scroll;
pub mod controller;
pub mod create;
pub mod drag;
pub mod geometry;
pub mod layout;
pub mod observable;
pub mod week_band;

pub use controller::{
    HapticFeedback, PointerEvent, TimelineController, TimelineFrame, TimelineSignal,
};
pub use geometry::TimeGrid;
pub use layout::PositionedBlock;
pub use week_band::WeekBandLayout;

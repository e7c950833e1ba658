mod app;
mod views;

pub use app::TimelineApp;
pub use views::parse_color;

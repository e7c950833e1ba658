pub mod list_view;
pub mod month_view;
mod palette;
pub mod timeline_view;

pub use palette::parse_color;

// Module exports for models

pub mod date_range;
pub mod occurrence;
pub mod settings;
pub mod ui;

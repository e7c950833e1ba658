// Calendar timeline library
// Exports all modules for testing and reuse

pub mod models;
pub mod services;
pub mod timeline;
pub mod ui_egui;
pub mod utils;

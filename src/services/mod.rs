// Service module exports

pub mod bridge;
pub mod commit;
pub mod repository;
pub mod settings;

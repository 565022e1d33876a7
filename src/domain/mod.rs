//! Domain layer - Pure business logic.

pub mod jobs;
pub mod progress;
pub mod registry;

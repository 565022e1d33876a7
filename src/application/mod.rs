//! Application layer - Services that drive the ports.

pub mod orchestrator;
pub mod probe;
pub mod sweeper;

pub use orchestrator::{ClipService, JobError, ServiceSettings, Submitted};
pub use sweeper::Sweeper;

//! clipd - Asynchronous video clipping service
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (jobs, progress, registry)
//! - ports/: Trait definitions (resolver, transcoder, artifact storage)
//! - adapters/: Concrete implementations (yt-dlp, ffmpeg, local fs, HTTP)
//! - application/: Clip orchestrator and background sweeper
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use adapters::local::{router, FsArtifactStore};
pub use application::{ClipService, ServiceSettings, Sweeper};
pub use config::ClipperConfig;
pub use domain::registry::JobRegistry;

//! Local adapters: on-disk artifact storage and the HTTP API.

pub mod fs;
pub mod http;

pub use fs::FsArtifactStore;
pub use http::router;

//! Ports - Trait definitions for the external collaborators of the clip pipeline.

pub mod resolver;
pub mod storage;
pub mod transcoder;

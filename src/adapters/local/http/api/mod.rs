pub mod clip;
pub mod download;
pub mod health;
pub mod progress;

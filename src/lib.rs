pub mod camelot;
pub mod config;
pub mod error;
pub mod justify;
pub mod loader;
pub mod model;
pub mod scoring;
pub mod sequencer;

/// Application name for XDG paths
pub const APP_NAME: &str = "mixplan";

//! Configuration module for the AuO recorder.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each subsystem,
//! `AppPaths` for cross-platform directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AudioConfig, Destination, ExportConfig, ExportFormat, PlaybackConfig,
    RenderConfig,
};

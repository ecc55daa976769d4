//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the runtime
//! by value.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

/// Container/codec used when a clip is saved.
///
/// | Variant | Encoder                         | MIME                     |
/// |---------|---------------------------------|--------------------------|
/// | Wav     | byte-exact IEEE float RIFF/WAVE | `audio/wav; codecs=3`    |
/// | Pcm16   | streaming 16-bit PCM session    | `audio/wav; codecs=1`    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Wav,
    Pcm16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::Wav
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Where an encoded clip goes once it has been produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Write the clip into [`ExportConfig::output_dir`].
    Download,
    /// POST the clip to [`ExportConfig::upload_url`]; the response body is
    /// the public URL of the stored clip.
    Upload,
}

impl Default for Destination {
    fn default() -> Self {
        Self::Download
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Echo every captured frame to the output device (pass-through
    /// monitoring).  On by default; turn it off when the speakers feed
    /// back into the microphone.
    pub monitor: bool,
    /// Fixed device block size in frames.  `None` lets the device choose.
    pub block_size: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            monitor: true,
            block_size: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RenderConfig
// ---------------------------------------------------------------------------

/// Waveform renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Render scheduler rate in ticks per second.
    pub fps: u32,
    /// Approximate number of time-axis labels per visible window.
    pub target_labels: usize,
    /// Initial viewport width in pixels.
    pub viewport_width: f64,
    /// Initial viewport height in pixels.
    pub viewport_height: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            target_labels: 10,
            viewport_width: 800.0,
            viewport_height: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Playback engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Positions closer than this to the end of the selection count as
    /// "finished", so the next play restarts from the trim start.
    pub resume_epsilon_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            resume_epsilon_secs: 1e-10,
        }
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Clip export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Encoder used by `save`.
    pub format: ExportFormat,
    /// Local file or HTTP upload.
    pub destination: Destination,
    /// Endpoint that accepts the POSTed clip and answers with its URL.
    pub upload_url: Option<String>,
    /// Directory for locally saved clips.  `None` means
    /// [`AppPaths::clips_dir`].
    pub output_dir: Option<PathBuf>,
    /// Upload request timeout in seconds.
    pub timeout_secs: u64,
    /// Frames per block fed to a streaming encode session.
    pub stream_block_frames: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            destination: Destination::default(),
            upload_url: None,
            output_dir: None,
            timeout_secs: 30,
            stream_block_frames: 4096,
        }
    }
}

impl ExportConfig {
    /// Directory clips are written to when saving locally.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| AppPaths::new().clips_dir)
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use auo::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// assert_eq!(config.render.fps, 60);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capture settings.
    pub audio: AudioConfig,
    /// Waveform renderer settings.
    pub render: RenderConfig,
    /// Playback engine settings.
    pub playback: PlaybackConfig,
    /// Clip export settings.
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet,
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.audio.monitor, loaded.audio.monitor);
        assert_eq!(original.audio.block_size, loaded.audio.block_size);
        assert_eq!(original.render.fps, loaded.render.fps);
        assert_eq!(original.render.target_labels, loaded.render.target_labels);
        assert_eq!(
            original.playback.resume_epsilon_secs,
            loaded.playback.resume_epsilon_secs
        );
        assert_eq!(original.export.format, loaded.export.format);
        assert_eq!(original.export.destination, loaded.export.destination);
        assert_eq!(original.export.timeout_secs, loaded.export.timeout_secs);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.render.fps, 60);
        assert_eq!(config.export.format, ExportFormat::Wav);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert!(cfg.audio.monitor);
        assert!(cfg.audio.block_size.is_none());
        assert_eq!(cfg.render.fps, 60);
        assert_eq!(cfg.render.target_labels, 10);
        assert_eq!(cfg.playback.resume_epsilon_secs, 1e-10);
        assert_eq!(cfg.export.destination, Destination::Download);
        assert!(cfg.export.upload_url.is_none());
        assert_eq!(cfg.export.stream_block_frames, 4096);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.audio.monitor = false;
        cfg.audio.block_size = Some(1024);
        cfg.render.viewport_width = 1280.0;
        cfg.playback.resume_epsilon_secs = 1e-6;
        cfg.export.format = ExportFormat::Pcm16;
        cfg.export.destination = Destination::Upload;
        cfg.export.upload_url = Some("https://localhost/receive".into());
        cfg.export.output_dir = Some(dir.path().join("clips"));

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert!(!loaded.audio.monitor);
        assert_eq!(loaded.audio.block_size, Some(1024));
        assert_eq!(loaded.render.viewport_width, 1280.0);
        assert_eq!(loaded.playback.resume_epsilon_secs, 1e-6);
        assert_eq!(loaded.export.format, ExportFormat::Pcm16);
        assert_eq!(loaded.export.destination, Destination::Upload);
        assert_eq!(
            loaded.export.upload_url.as_deref(),
            Some("https://localhost/receive")
        );
        assert_eq!(loaded.export.resolved_output_dir(), dir.path().join("clips"));
    }

    #[test]
    fn partial_file_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[render]\nfps = \"fast\"\n").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }
}

//! Where `auo` keeps its files, resolved with the `dirs` crate.
//!
//! | File / dir      | Linux                          | macOS                                    | Windows                    |
//! |-----------------|--------------------------------|------------------------------------------|----------------------------|
//! | `settings.toml` | `~/.config/auo/`               | `~/Library/Application Support/auo/`     | `%APPDATA%\auo\`           |
//! | `clips/`        | `~/.local/share/auo/`          | `~/Library/Application Support/auo/`     | `%LOCALAPPDATA%\auo\`      |

use std::path::{Path, PathBuf};

const APP_NAME: &str = "auo";
const SETTINGS_FILE: &str = "settings.toml";
const CLIPS_DIR: &str = "clips";

/// Resolved locations of the settings file and the local clip directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default directory for clips saved with the `Download` destination.
    pub clips_dir: PathBuf,
}

impl AppPaths {
    /// Resolve against the platform directories.  A platform without a
    /// standard location falls back to the working directory.
    pub fn new() -> Self {
        Self::under(
            &app_dir(dirs::config_dir()),
            &app_dir(dirs::data_local_dir()),
        )
    }

    /// Lay the files out under explicit config and data directories.
    pub fn under(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            clips_dir: data_dir.join(CLIPS_DIR),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Timeline editing behaviour.
    pub editor: EditorDefaults,

    /// Preview and audio synchronization.
    pub playback: PlaybackDefaults,

    /// Default export parameters.
    pub export: ExportDefaults,

    /// Text rendering.
    pub text: TextDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Limits and tolerances used by timeline edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Number of undo snapshots kept before the oldest is evicted.
    pub history_capacity: usize,

    /// Snap distance in screen pixels.
    pub snap_threshold_px: f64,

    /// Spacing of the snap grid in seconds.
    pub grid_interval_secs: f64,

    /// Shortest clip the editor will commit.
    pub min_clip_duration_secs: f64,

    /// Splits closer than this to either clip edge are rejected.
    pub split_guard_secs: f64,

    /// Gap left between a clip and its duplicate.
    pub duplicate_gap_secs: f64,

    /// Initial timeline zoom in pixels per second.
    pub default_zoom: f64,
}

/// Playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    /// Master gain applied on top of every clip volume, [0.0, 1.0].
    pub master_volume: f64,

    /// Transport drift (seconds) tolerated before a hard seek.
    pub resync_threshold_secs: f64,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Output frame rate.
    pub fps: u32,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,
}

/// Text rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TextDefaults {
    /// TrueType/OpenType font used for text clips.
    pub font_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cutline=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            snap_threshold_px: 5.0,
            grid_interval_secs: 0.5,
            min_clip_duration_secs: 0.1,
            split_guard_secs: 0.05,
            duplicate_gap_secs: 0.1,
            default_zoom: 50.0,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            resync_threshold_secs: 0.3,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1280,
            height: 720,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, crate::CutlineError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(config_file_path())
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cutline").join("config.json")
}

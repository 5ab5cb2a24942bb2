use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "jobhunter";
const RESULTS_FILENAME: &str = "job_details.json";
const TRACKED_FILENAME: &str = "tracked_jobs.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
    #[serde(default = "default_tracked_file")]
    pub tracked_file: PathBuf,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            results_file: default_results_file(),
            tracked_file: default_tracked_file(),
            queue: QueueConfig::default(),
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Directory holding both collections when no explicit paths are configured.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_results_file() -> PathBuf {
    default_data_dir().join(RESULTS_FILENAME)
}

fn default_tracked_file() -> PathBuf {
    default_data_dir().join(TRACKED_FILENAME)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Pause between two consecutive extractions, in milliseconds.
    #[serde(default = "default_pace_delay_ms")]
    pub pace_delay_ms: u64,
}

fn default_pace_delay_ms() -> u64 {
    2000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            pace_delay_ms: default_pace_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// How long a soft-deleted tracking record can still be restored.
    #[serde(default = "default_undo_window_secs")]
    pub undo_window_secs: u64,
}

/// Longest accepted undo window (one day).
pub const MAX_UNDO_WINDOW_SECS: u64 = 86_400;

fn default_undo_window_secs() -> u64 {
    30
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            undo_window_secs: default_undo_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

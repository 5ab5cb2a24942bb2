use std::path::Path;

use crate::config::schema::{AppConfig, MAX_UNDO_WINDOW_SECS};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.results_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "results_file must not be empty".to_string(),
        });
    }

    if config.tracked_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            message: "tracked_file must not be empty".to_string(),
        });
    }

    // Both stores rewrite their file wholesale, sharing one would clobber the other.
    if config.results_file == config.tracked_file {
        return Err(ConfigError::Validation {
            message: format!(
                "results_file and tracked_file must differ (both are '{}')",
                config.results_file.display()
            ),
        });
    }

    if config.tracking.undo_window_secs == 0 {
        return Err(ConfigError::Validation {
            message: "tracking.undo_window_secs must be greater than 0".to_string(),
        });
    }

    if config.tracking.undo_window_secs > MAX_UNDO_WINDOW_SECS {
        return Err(ConfigError::Validation {
            message: format!(
                "tracking.undo_window_secs must be at most {} (got {})",
                MAX_UNDO_WINDOW_SECS, config.tracking.undo_window_secs
            ),
        });
    }

    Ok(())
}

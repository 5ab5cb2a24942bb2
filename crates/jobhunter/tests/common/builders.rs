//! Builders for test configuration and records.

#![allow(dead_code)]

use std::path::Path;

use jobhunter::config::{AppConfig, LoggingConfig, QueueConfig, TrackingConfig};
use jobhunter::Record;
use serde_json::{json, Value};

/// Builder for `AppConfig` rooted in a scratch directory.
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Both collections inside `dir`, no pacing delay.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: AppConfig {
                results_file: dir.join("job_details.json"),
                tracked_file: dir.join("tracked_jobs.json"),
                queue: QueueConfig { pace_delay_ms: 0 },
                tracking: TrackingConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }

    pub fn pace_delay_ms(mut self, delay: u64) -> Self {
        self.config.queue.pace_delay_ms = delay;
        self
    }

    pub fn undo_window_secs(mut self, secs: u64) -> Self {
        self.config.tracking.undo_window_secs = secs;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// A posting record the way a page extractor would return it.
pub fn posting(title: &str, company: &str) -> Record {
    match json!({
        "job_title": title,
        "company_name": company,
        "salary": "20-30K",
        "job_tags": ["rust", "backend"],
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

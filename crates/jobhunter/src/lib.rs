pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod queue;
pub mod store;
pub mod telemetry;
pub mod tracking;

pub use app::JobHunter;
pub use config::{load_config, AppConfig};
pub use error::{ConfigError, JobHunterError, LoggingError, Result, StoreError};
pub use extract::{ExtractError, Extractor, StaticExtractor};
pub use queue::{StatusSummary, Task, TaskQueue, TaskStatus};
pub use store::{Record, ResultStore};
pub use telemetry::init_logging;
pub use tracking::{
    derive_job_id, Priority, TrackError, TrackOptions, TrackStatus, TrackUpdate, TrackedJob,
    TrackingStore,
};

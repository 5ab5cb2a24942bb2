//! Personal tracking list built from extracted postings.

pub mod error;
pub mod job_id;
pub mod record;
pub mod store;

pub use error::TrackError;
pub use job_id::derive_job_id;
pub use record::{AnalysisTags, Priority, TrackOptions, TrackStatus, TrackUpdate, TrackedJob};
pub use store::TrackingStore;

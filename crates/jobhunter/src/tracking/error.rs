//! Tracking list error types.

use thiserror::Error;

use crate::error::StoreError;

/// Errors surfaced by the tracking store.
#[derive(Error, Debug)]
pub enum TrackError {
    /// A record with the same derived id is already tracked.
    #[error("Job '{job_id}' is already being tracked")]
    DuplicateKey { job_id: String },

    #[error("Job '{0}' is not in the tracking list")]
    NotFound(String),

    /// The undo window for a deleted record has passed.
    #[error("Undo window for job '{0}' has expired")]
    Expired(String),

    #[error("Tracking storage failed: {0}")]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, TrackError>;

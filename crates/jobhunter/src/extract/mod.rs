//! The page extraction capability consumed by the task queue.
//!
//! Fetching and parsing a posting lives outside this crate. The queue only
//! needs something that can turn a URL into a [`Record`] and that owns any
//! expensive shared resource (a browser session, an HTTP client pool)
//! behind an explicit `acquire`/`release` pair.

pub mod stub;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::Record;

pub use stub::StaticExtractor;

/// Errors an extractor can report.
///
/// Every variant marks the task as failed; only [`ExtractError::Acquire`]
/// stops the drain loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The shared resource could not be started.
    #[error("Failed to acquire extraction resource: {0}")]
    Acquire(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The site answered with a bot check or security page.
    #[error("Blocked by security check: {0}")]
    Blocked(String),

    /// The page loaded but the expected fields were missing.
    #[error("Extraction returned no data: {0}")]
    EmptyResult(String),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Starts the shared resource. Must be a no-op when already acquired.
    async fn acquire(&self) -> Result<(), ExtractError>;

    /// Extracts one posting.
    async fn extract(&self, url: &str) -> Result<Record, ExtractError>;

    /// Tears down the shared resource.
    async fn release(&self);
}

//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod builders;

use std::sync::Arc;

use jobhunter::{JobHunter, StaticExtractor};
use tempfile::TempDir;

/// A `JobHunter` wired to a scripted extractor inside a scratch directory.
pub struct Harness {
    pub dir: TempDir,
    pub extractor: Arc<StaticExtractor>,
    pub hunter: JobHunter,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_extractor(StaticExtractor::new())
    }

    pub fn with_extractor(extractor: StaticExtractor) -> Self {
        Self::with_config(extractor, |builder| builder)
    }

    /// Like [`Harness::with_extractor`], with the default test config adjusted by `configure`.
    pub fn with_config<F>(extractor: StaticExtractor, configure: F) -> Self
    where
        F: FnOnce(builders::ConfigBuilder) -> builders::ConfigBuilder,
    {
        let dir = TempDir::new().unwrap();
        let config = configure(builders::ConfigBuilder::in_dir(dir.path())).build();
        let extractor = Arc::new(extractor);
        let hunter = JobHunter::new(&config, extractor.clone()).unwrap();

        Self {
            dir,
            extractor,
            hunter,
        }
    }
}

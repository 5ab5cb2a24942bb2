//! Entry point bundling the queue, the result store and the tracking list.
//!
//! A request layer (HTTP, CLI, desktop shell) holds one [`JobHunter`] and
//! calls straight into it; nothing here knows about transport.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::config::{load_config, AppConfig};
use crate::error::{Result, StoreError};
use crate::extract::Extractor;
use crate::queue::{StatusSummary, Task, TaskQueue};
use crate::store::{Record, ResultStore};
use crate::tracking::{TrackError, TrackOptions, TrackUpdate, TrackedJob, TrackingStore};

pub struct JobHunter {
    queue: TaskQueue,
    results: Arc<ResultStore>,
    tracking: TrackingStore,
}

impl JobHunter {
    /// Opens both stores (bootstrapping the results file) and wires the queue.
    pub fn new(config: &AppConfig, extractor: Arc<dyn Extractor>) -> Result<Self> {
        let results = Arc::new(ResultStore::open(&config.results_file)?);
        let queue = TaskQueue::new(extractor, Arc::clone(&results), &config.queue);
        let tracking = TrackingStore::new(&config.tracked_file, &config.tracking);

        info!(
            "Job hunter ready (results: {}, tracked: {})",
            config.results_file.display(),
            config.tracked_file.display()
        );

        Ok(Self {
            queue,
            results,
            tracking,
        })
    }

    /// Loads and validates the config at `path`, then builds as [`JobHunter::new`].
    pub fn from_config_file<P: AsRef<Path>>(path: P, extractor: Arc<dyn Extractor>) -> Result<Self> {
        let config = load_config(path)?;
        Self::new(&config, extractor)
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    // ─── Ingestion ──────────────────────────────────────────────────────────

    pub fn submit<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.queue.submit(urls)
    }

    pub fn status_summary(&self) -> StatusSummary {
        self.queue.status_summary()
    }

    pub fn list_all_results(&self) -> Vec<Record> {
        self.results.read_all()
    }

    pub fn list_failed(&self) -> Vec<Task> {
        self.queue.list_failed()
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.queue.list_tasks()
    }

    pub fn retry<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.queue.retry(urls)
    }

    pub fn delete_results<I, S>(&self, urls: I) -> std::result::Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: HashSet<String> = urls.into_iter().map(|u| u.as_ref().to_string()).collect();
        self.results.delete(&keys)
    }

    // ─── Tracking ───────────────────────────────────────────────────────────

    pub fn track_add(
        &self,
        job_url: &str,
        job_title: &str,
        company_name: &str,
    ) -> std::result::Result<TrackedJob, TrackError> {
        self.tracking.add(job_url, job_title, company_name)
    }

    pub fn track_update(
        &self,
        job_id: &str,
        update: &TrackUpdate,
    ) -> std::result::Result<TrackedJob, TrackError> {
        self.tracking.update(job_id, update)
    }

    pub fn track_delete(&self, job_id: &str) -> std::result::Result<bool, TrackError> {
        self.tracking.soft_delete(job_id)
    }

    pub fn track_undo(&self, job_id: &str) -> std::result::Result<TrackedJob, TrackError> {
        self.tracking.undo(job_id)
    }

    pub fn track_list(&self) -> Vec<TrackedJob> {
        self.tracking.list()
    }

    pub fn track_options(&self) -> TrackOptions {
        TrackOptions::default()
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Restarts a stalled queue. Returns whether a drain loop was started.
    pub fn resume(&self) -> bool {
        self.queue.resume()
    }

    pub async fn wait_idle(&self) {
        self.queue.wait_idle().await
    }

    pub async fn shutdown(&self) {
        self.queue.shutdown().await
    }
}

//! Tracking store with soft delete and a time-bounded undo.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::Instant;

use crate::config::{TrackingConfig, MAX_UNDO_WINDOW_SECS};
use crate::store::JsonFile;

use super::error::{Result, TrackError};
use super::job_id::derive_job_id;
use super::record::{TrackUpdate, TrackedJob};

/// A soft-deleted record waiting out its undo window.
struct DeletedEntry {
    job: TrackedJob,
    deadline: Instant,
}

struct Inner {
    file: JsonFile,
    /// Process-lifetime only; lost on restart.
    deleted: HashMap<String, DeletedEntry>,
}

/// Flat-file list of tracked postings keyed by `job_id`.
///
/// The file and the undo buffer share one lock, so a delete and its undo
/// are each a single atomic step with respect to other callers.
pub struct TrackingStore {
    inner: Mutex<Inner>,
    undo_window: Duration,
}

impl TrackingStore {
    /// Windows longer than [`MAX_UNDO_WINDOW_SECS`] are capped.
    pub fn new<P: AsRef<Path>>(path: P, config: &TrackingConfig) -> Self {
        let secs = if config.undo_window_secs > MAX_UNDO_WINDOW_SECS {
            warn!(
                "Undo window of {}s exceeds the maximum, capping at {}s",
                config.undo_window_secs, MAX_UNDO_WINDOW_SECS
            );
            MAX_UNDO_WINDOW_SECS
        } else {
            config.undo_window_secs
        };

        Self {
            inner: Mutex::new(Inner {
                file: JsonFile::new(path),
                deleted: HashMap::new(),
            }),
            undo_window: Duration::from_secs(secs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Tracking store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn undo_window(&self) -> Duration {
        self.undo_window
    }

    /// All tracked records in file order.
    pub fn list(&self) -> Vec<TrackedJob> {
        self.lock().file.read()
    }

    pub fn get(&self, job_id: &str) -> Option<TrackedJob> {
        self.list().into_iter().find(|job| job.job_id == job_id)
    }

    /// Starts tracking a posting. Fails if its derived id is already tracked.
    pub fn add(&self, job_url: &str, job_title: &str, company_name: &str) -> Result<TrackedJob> {
        let inner = self.lock();
        let mut jobs: Vec<TrackedJob> = inner.file.load()?;
        let job_id = derive_job_id(job_url);

        if jobs.iter().any(|job| job.job_id == job_id) {
            return Err(TrackError::DuplicateKey { job_id });
        }

        let job = TrackedJob::new(job_id, job_url, job_title, company_name);
        jobs.push(job.clone());
        inner.file.write(&jobs)?;

        info!("Tracking job {} ({})", job.job_id, job.job_title);
        Ok(job)
    }

    /// Applies the allow-listed fields of `update` to a tracked record.
    pub fn update(&self, job_id: &str, update: &TrackUpdate) -> Result<TrackedJob> {
        let inner = self.lock();
        let mut jobs: Vec<TrackedJob> = inner.file.load()?;

        let Some(job) = jobs.iter_mut().find(|job| job.job_id == job_id) else {
            return Err(TrackError::NotFound(job_id.to_string()));
        };
        if update.is_empty() {
            return Ok(job.clone());
        }
        update.apply(job);
        let updated = job.clone();

        inner.file.write(&jobs)?;
        debug!("Updated tracked job {}", job_id);
        Ok(updated)
    }

    /// Removes a record, keeping a copy restorable for the undo window.
    ///
    /// Returns `false` when nothing with that id is tracked.
    pub fn soft_delete(&self, job_id: &str) -> Result<bool> {
        let mut inner = self.lock();
        let mut jobs: Vec<TrackedJob> = inner.file.load()?;

        let Some(pos) = jobs.iter().position(|job| job.job_id == job_id) else {
            return Ok(false);
        };
        let job = jobs.remove(pos);
        inner.file.write(&jobs)?;

        inner.deleted.insert(
            job_id.to_string(),
            DeletedEntry {
                job,
                deadline: Instant::now() + self.undo_window,
            },
        );

        info!("Removed tracked job {} (undo available)", job_id);
        Ok(true)
    }

    /// Restores a soft-deleted record if its undo window is still open.
    pub fn undo(&self, job_id: &str) -> Result<TrackedJob> {
        let mut inner = self.lock();

        let Some(entry) = inner.deleted.get(job_id) else {
            return Err(TrackError::NotFound(job_id.to_string()));
        };

        if Instant::now() > entry.deadline {
            inner.deleted.remove(job_id);
            info!("Undo window expired for tracked job {}", job_id);
            return Err(TrackError::Expired(job_id.to_string()));
        }

        let mut jobs: Vec<TrackedJob> = inner.file.load()?;
        // Re-tracked since the delete: restoring would duplicate the key.
        if jobs.iter().any(|job| job.job_id == job_id) {
            return Err(TrackError::DuplicateKey {
                job_id: job_id.to_string(),
            });
        }

        let job = entry.job.clone();
        jobs.push(job.clone());
        inner.file.write(&jobs)?;
        inner.deleted.remove(job_id);

        info!("Restored tracked job {}", job_id);
        Ok(job)
    }
}

//! Task registry and its single drain loop.
//!
//! The registry maps every submitted URL to a [`Task`] and keeps a FIFO of
//! URLs waiting for extraction. One background drain loop at most works the
//! FIFO; it is spawned on demand and exits when the FIFO is empty.
//!
//! All registry state, including the "loop running" flag, sits behind one
//! mutex. The loop clears the flag under that lock when it finds the FIFO
//! empty, and enqueuers check-and-set it under the same lock, so a URL can
//! never be enqueued after the loop decided to stop without a new loop
//! being started for it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::QueueConfig;
use crate::extract::{ExtractError, Extractor};
use crate::queue::task::{StatusSummary, Task, TaskStatus};
use crate::store::{stamp_record, ResultStore};

#[derive(Default)]
struct QueueState {
    tasks: HashMap<String, Task>,
    pending: VecDeque<String>,
    running: bool,
    active: Option<String>,
    /// No new loop may start and the current one stops before its next task.
    closed: bool,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<QueueState>,
    idle: Notify,
    extractor: Arc<dyn Extractor>,
    results: Arc<ResultStore>,
    pace_delay: Duration,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                warn!("Task registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Pops the next URL and marks it processing, or stops the loop when
    /// there is nothing left (or the registry was closed).
    fn next_task(&self) -> Option<String> {
        let mut state = self.lock_state();

        let next = if state.closed {
            None
        } else {
            state.pending.pop_front()
        };

        match next {
            Some(url) => {
                if let Some(task) = state.tasks.get_mut(&url) {
                    task.mark_processing();
                }
                state.active = Some(url.clone());
                Some(url)
            }
            None => {
                state.running = false;
                state.active = None;
                None
            }
        }
    }

    async fn run_task(&self, url: &str) {
        debug!("Extracting");
        let outcome = self.extractor.extract(url).await;

        match outcome {
            Ok(mut record) => {
                stamp_record(&mut record, url, Utc::now());
                if let Err(e) = self.results.upsert(record.clone()) {
                    error!(error = %e, "Failed to persist extracted record");
                }

                let mut state = self.lock_state();
                if let Some(task) = state.tasks.get_mut(url) {
                    task.mark_completed(record);
                }
                state.active = None;
                info!("Task completed");
            }
            Err(e) => {
                let mut state = self.lock_state();
                if let Some(task) = state.tasks.get_mut(url) {
                    task.mark_failed(&e);
                }
                state.active = None;
                warn!(error = %e, "Task failed");
            }
        }
    }
}

/// Clears the running flag if the drain loop unwinds mid-task.
struct DrainGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.lock_state();
        if let Some(url) = state.active.take() {
            if let Some(task) = state.tasks.get_mut(&url) {
                task.mark_failed(&ExtractError::Other("extraction panicked".to_string()));
            }
        }
        state.running = false;
        drop(state);
        self.shared.idle.notify_waiters();
    }
}

async fn drain(shared: Arc<Shared>) {
    let mut guard = DrainGuard {
        shared: Arc::clone(&shared),
        armed: true,
    };

    info!("Starting queue drain");

    if let Err(e) = shared.extractor.acquire().await {
        // Queue stays populated; the next submit, retry or resume restarts us.
        error!(error = %e, "Failed to acquire extractor, stopping drain");
        {
            let mut state = shared.lock_state();
            state.running = false;
            state.active = None;
        }
        guard.armed = false;
        shared.idle.notify_waiters();
        return;
    }

    let mut processed = 0usize;
    while let Some(url) = shared.next_task() {
        shared
            .run_task(&url)
            .instrument(info_span!("task", url = %url))
            .await;
        processed += 1;

        tokio::time::sleep(shared.pace_delay).await;
    }

    guard.armed = false;
    info!(processed, "Queue empty, drain finished");
    shared.idle.notify_waiters();
}

/// Registry of submitted URLs plus the FIFO feeding the drain loop.
///
/// Cloning is cheap and every clone drives the same registry.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl TaskQueue {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        results: Arc<ResultStore>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
                extractor,
                results,
                pace_delay: Duration::from_millis(config.pace_delay_ms),
            }),
        }
    }

    /// Enqueues every trimmed, non-empty URL that is not already pending or
    /// processing. Returns how many were added.
    ///
    /// Must be called from within a tokio runtime for the drain loop to start.
    pub fn submit<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.shared.lock_state();
        let mut added = 0;

        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() {
                continue;
            }
            if state.tasks.get(url).is_some_and(|t| t.status.is_active()) {
                debug!(url, "Already queued, skipping");
                continue;
            }

            state.tasks.insert(url.to_string(), Task::new(url));
            state.pending.push_back(url.to_string());
            added += 1;
        }

        if added > 0 {
            info!(added, queue_length = state.pending.len(), "Tasks submitted");
        }

        self.start_if_idle(&mut state);
        added
    }

    /// Re-enqueues the given URLs that are currently failed. Returns how many were.
    pub fn retry<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.shared.lock_state();
        let mut retried = 0;

        for url in urls {
            let url = url.as_ref().trim();
            let Some(task) = state.tasks.get_mut(url) else {
                continue;
            };
            if task.status != TaskStatus::Failed {
                continue;
            }

            task.reset_for_retry();
            state.pending.push_back(url.to_string());
            retried += 1;
        }

        if retried > 0 {
            info!(retried, "Failed tasks re-queued");
        }

        self.start_if_idle(&mut state);
        retried
    }

    /// Starts a drain loop if none is running and work is waiting.
    ///
    /// Recovers a queue left behind by a loop that could not acquire the extractor.
    pub fn resume(&self) -> bool {
        let mut state = self.shared.lock_state();
        self.start_if_idle(&mut state)
    }

    fn start_if_idle(&self, state: &mut QueueState) -> bool {
        if state.running || state.closed || state.pending.is_empty() {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "No tokio runtime available, drain loop not started");
                return false;
            }
        };

        state.running = true;
        let shared = Arc::clone(&self.shared);
        let handle = runtime.spawn(drain(shared).instrument(info_span!("drain")));
        state.handle = Some(handle);
        true
    }

    pub fn status_summary(&self) -> StatusSummary {
        let state = self.shared.lock_state();
        let count = |status: TaskStatus| state.tasks.values().filter(|t| t.status == status).count();

        StatusSummary {
            queue_length: state.pending.len(),
            active_task: state.active.clone(),
            completed_count: count(TaskStatus::Completed),
            failed_count: count(TaskStatus::Failed),
            total_tasks: state.tasks.len(),
            running: state.running,
        }
    }

    pub fn list_failed(&self) -> Vec<Task> {
        let mut failed: Vec<Task> = self
            .shared
            .lock_state()
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Failed)
            .cloned()
            .collect();
        failed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        failed
    }

    /// Every task in the registry, oldest first.
    pub fn list_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.shared.lock_state().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tasks
    }

    pub fn get(&self, url: &str) -> Option<Task> {
        self.shared.lock_state().tasks.get(url.trim()).cloned()
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock_state().running
    }

    /// Waits until no drain loop is active.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    /// Stops the drain loop after its current task and releases the extractor.
    ///
    /// Queued tasks stay pending. Submissions are still recorded afterwards
    /// but no loop is started for them.
    pub async fn shutdown(&self) {
        let handle = {
            let mut state = self.shared.lock_state();
            state.closed = true;
            state.handle.take()
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Drain loop panicked");
            }
        }

        self.shared.extractor.release().await;
        info!("Task queue shut down");
    }
}

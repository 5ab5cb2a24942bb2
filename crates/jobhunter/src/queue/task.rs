use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::ExtractError;
use crate::store::Record;

/// Lifecycle state of a submitted URL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Pending or processing: the URL is already on its way through the queue.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Processing)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One submitted URL and the outcome of its latest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The URL itself; the dedup key.
    pub id: String,
    pub url: String,
    pub status: TaskStatus,
    /// Extracted record (set on completion).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Record>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(url: &str) -> Self {
        let now = Utc::now();
        Self {
            id: url.to_string(),
            url: url.to_string(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn mark_processing(&mut self) {
        self.status = TaskStatus::Processing;
        self.touch();
    }

    pub(crate) fn mark_completed(&mut self, record: Record) {
        self.status = TaskStatus::Completed;
        self.result = Some(record);
        self.error = None;
        self.touch();
    }

    pub(crate) fn mark_failed(&mut self, error: &ExtractError) {
        self.status = TaskStatus::Failed;
        self.error = Some(error.to_string());
        self.touch();
    }

    /// Puts a failed task back to pending for another run.
    pub(crate) fn reset_for_retry(&mut self) {
        self.status = TaskStatus::Pending;
        self.error = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusSummary {
    pub queue_length: usize,
    /// URL currently being extracted.
    pub active_task: Option<String>,
    pub completed_count: usize,
    pub failed_count: usize,
    pub total_tasks: usize,
    /// Whether a drain loop is active.
    pub running: bool,
}

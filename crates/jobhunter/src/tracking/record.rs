use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Where an application stands.
///
/// The aliases are the labels older tracking files were written with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrackStatus {
    #[default]
    #[serde(rename = "pending-apply", alias = "待投递")]
    PendingApply,
    #[serde(rename = "applied", alias = "已投递")]
    Applied,
    #[serde(rename = "interview-1", alias = "一面")]
    Interview1,
    #[serde(rename = "interview-2", alias = "二面")]
    Interview2,
    #[serde(rename = "interview-3", alias = "三面")]
    Interview3,
    #[serde(rename = "awaiting-result", alias = "待开奖")]
    AwaitingResult,
    #[serde(rename = "offer", alias = "Offer")]
    Offer,
    #[serde(rename = "rejected", alias = "拒绝")]
    Rejected,
    #[serde(rename = "withdrawn", alias = "放弃")]
    Withdrawn,
}

impl TrackStatus {
    pub const ALL: [TrackStatus; 9] = [
        TrackStatus::PendingApply,
        TrackStatus::Applied,
        TrackStatus::Interview1,
        TrackStatus::Interview2,
        TrackStatus::Interview3,
        TrackStatus::AwaitingResult,
        TrackStatus::Offer,
        TrackStatus::Rejected,
        TrackStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::PendingApply => "pending-apply",
            TrackStatus::Applied => "applied",
            TrackStatus::Interview1 => "interview-1",
            TrackStatus::Interview2 => "interview-2",
            TrackStatus::Interview3 => "interview-3",
            TrackStatus::AwaitingResult => "awaiting-result",
            TrackStatus::Offer => "offer",
            TrackStatus::Rejected => "rejected",
            TrackStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reserved for later analysis; always null for now.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisTags {
    pub risk_level: Option<String>,
    pub match_score: Option<f64>,
}

/// A posting the user chose to follow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedJob {
    pub job_id: String,
    pub job_url: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub track_status: TrackStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(deserialize_with = "deserialize_added_at")]
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub interview_at: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub analysis_tags: AnalysisTags,
}

impl TrackedJob {
    pub fn new(job_id: String, job_url: &str, job_title: &str, company_name: &str) -> Self {
        Self {
            job_id,
            job_url: job_url.to_string(),
            job_title: job_title.to_string(),
            company_name: company_name.to_string(),
            track_status: TrackStatus::default(),
            priority: Priority::default(),
            added_at: Utc::now(),
            applied_at: None,
            interview_at: None,
            notes: String::new(),
            analysis_tags: AnalysisTags::default(),
        }
    }
}

/// Accepts RFC 3339 as well as a bare `YYYY-MM-DDTHH:MM:SS[.ffffff]`, read as UTC.
fn deserialize_added_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Fields a user may change after a posting is tracked.
///
/// Absent fields are left alone. Deserializing ignores any other keys, so a
/// payload carrying e.g. `job_title` cannot rename a record.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TrackUpdate {
    #[serde(default)]
    pub track_status: Option<TrackStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub interview_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TrackUpdate {
    pub fn is_empty(&self) -> bool {
        self.track_status.is_none()
            && self.priority.is_none()
            && self.applied_at.is_none()
            && self.interview_at.is_none()
            && self.notes.is_none()
    }

    pub(crate) fn apply(&self, job: &mut TrackedJob) {
        if let Some(status) = self.track_status {
            job.track_status = status;
        }
        if let Some(priority) = self.priority {
            job.priority = priority;
        }
        if let Some(applied_at) = &self.applied_at {
            job.applied_at = Some(applied_at.clone());
        }
        if let Some(interview_at) = &self.interview_at {
            job.interview_at = Some(interview_at.clone());
        }
        if let Some(notes) = &self.notes {
            job.notes = notes.clone();
        }
    }
}

/// Valid values for the two enumerated tracking fields.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackOptions {
    pub statuses: Vec<TrackStatus>,
    pub priorities: Vec<Priority>,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            statuses: TrackStatus::ALL.to_vec(),
            priorities: Priority::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_defaults() {
        let job = TrackedJob::new("ABC".to_string(), "https://x/job_detail/ABC.html", "Dev", "Acme");
        assert_eq!(job.track_status, TrackStatus::PendingApply);
        assert_eq!(job.priority, Priority::Medium);
        assert!(job.applied_at.is_none());
        assert!(job.interview_at.is_none());
        assert!(job.notes.is_empty());
        assert_eq!(job.analysis_tags, AnalysisTags::default());
    }

    #[test]
    fn test_serialized_shape() {
        let job = TrackedJob::new("ABC".to_string(), "https://x", "Dev", "Acme");
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["track_status"], "pending-apply");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["applied_at"], serde_json::Value::Null);
        assert_eq!(value["analysis_tags"]["risk_level"], serde_json::Value::Null);
        assert_eq!(value["analysis_tags"]["match_score"], serde_json::Value::Null);
    }

    #[test]
    fn test_reads_legacy_record() {
        let job: TrackedJob = serde_json::from_value(json!({
            "job_id": "OLD1",
            "job_url": "https://www.zhipin.com/job_detail/OLD1.html",
            "job_title": "Data Engineer",
            "company_name": "Initech",
            "track_status": "一面",
            "priority": "high",
            "added_at": "2024-05-01T10:00:00.123456",
            "applied_at": null,
            "interview_at": null,
            "notes": "",
            "analysis_tags": { "risk_level": null, "match_score": null }
        }))
        .unwrap();

        assert_eq!(job.track_status, TrackStatus::Interview1);
        assert_eq!(job.added_at.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");

        // Written back in the current shape.
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["track_status"], "interview-1");
    }

    #[test]
    fn test_added_at_rejects_garbage() {
        let result: Result<TrackedJob, _> = serde_json::from_value(json!({
            "job_id": "X",
            "job_url": "https://x",
            "added_at": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_strings_match_serde() {
        for status in TrackStatus::ALL {
            let value = serde_json::to_value(status).unwrap();
            assert_eq!(value, json!(status.as_str()));
        }
        for priority in Priority::ALL {
            let value = serde_json::to_value(priority).unwrap();
            assert_eq!(value, json!(priority.to_string()));
        }
    }

    #[test]
    fn test_update_ignores_unknown_fields() {
        let update: TrackUpdate = serde_json::from_value(json!({
            "track_status": "interview-2",
            "notes": "call back friday",
            "job_title": "Renamed",
            "company_name": "Other Co",
            "added_at": "1999-01-01T00:00:00Z"
        }))
        .unwrap();

        let mut job = TrackedJob::new("ABC".to_string(), "https://x", "Dev", "Acme");
        let added_at = job.added_at;
        update.apply(&mut job);

        assert_eq!(job.track_status, TrackStatus::Interview2);
        assert_eq!(job.notes, "call back friday");
        assert_eq!(job.job_title, "Dev");
        assert_eq!(job.company_name, "Acme");
        assert_eq!(job.added_at, added_at);
        assert_eq!(job.priority, Priority::Medium);
    }

    #[test]
    fn test_update_rejects_unknown_status_value() {
        let result: Result<TrackUpdate, _> =
            serde_json::from_value(json!({ "track_status": "hired-on-the-spot" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_update() {
        assert!(TrackUpdate::default().is_empty());
        let update = TrackUpdate {
            priority: Some(Priority::High),
            ..TrackUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_options_enumerate_everything() {
        let options = TrackOptions::default();
        assert_eq!(options.statuses.len(), 9);
        assert_eq!(options.statuses[0], TrackStatus::PendingApply);
        assert_eq!(options.priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }
}

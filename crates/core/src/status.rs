//! Remote job status values and the notifications derived from them.

use serde::{Deserialize, Serialize};

/// Progress reported for a non-terminal or failed job when the remote
/// payload carries none.
pub const DEFAULT_PROGRESS: f64 = 0.0;

/// Progress reported for a finished job when the remote payload carries none.
pub const FINISHED_PROGRESS: f64 = 100.0;

/// Lifecycle status of a remote job.
///
/// `Unknown` is never a real remote state worth polling again: it marks a
/// status query that could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JobStatus {
    Queued,
    Started,
    Finished,
    /// Generic terminal error family (`failed`, `error`, `cancelled`, ...).
    Failed,
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    /// Whether no further polling happens after this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Unknown)
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "started" => Self::Started,
            "finished" => Self::Finished,
            "unknown" => Self::Unknown,
            _ => Self::Failed,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body returned by a single remote status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    /// Completion percentage (0-100), when the backend reports one.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Diagnostic text attached to failures.
    #[serde(default)]
    pub exc_info: Option<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            progress: None,
            exc_info: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_exc_info(mut self, exc_info: impl Into<String>) -> Self {
        self.exc_info = Some(exc_info.into());
        self
    }
}

/// A notification delivered to every observer of a tracked request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub progress: f64,
    /// Present for `failed` and `unknown` updates only.
    pub message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: JobStatus, progress: f64) -> Self {
        Self {
            status,
            progress,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(JobStatus::from("queued"), JobStatus::Queued);
        assert_eq!(JobStatus::from("STARTED"), JobStatus::Started);
        assert_eq!(JobStatus::from("finished"), JobStatus::Finished);
        assert_eq!(JobStatus::from("unknown"), JobStatus::Unknown);
    }

    #[test]
    fn unrecognised_statuses_fall_into_failed_family() {
        assert_eq!(JobStatus::from("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from("error"), JobStatus::Failed);
        assert_eq!(JobStatus::from("cancelled"), JobStatus::Failed);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn deserializes_report_with_missing_optionals() {
        let report: StatusReport = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert_eq!(report, StatusReport::new(JobStatus::Queued));
    }

    #[test]
    fn deserializes_failed_report() {
        let report: StatusReport = serde_json::from_str(
            r#"{"status":"error","progress":35.5,"exc_info":"CUDA out of memory"}"#,
        )
        .unwrap();
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.progress, Some(35.5));
        assert_eq!(report.exc_info.as_deref(), Some("CUDA out of memory"));
    }

    #[test]
    fn update_serializes_lowercase_status() {
        let update = StatusUpdate::new(JobStatus::Started, 60.0);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "started");
        assert_eq!(json["progress"], 60.0);
        assert!(json["message"].is_null());
    }
}

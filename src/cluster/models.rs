use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job state as reported by the Flink REST API
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Initializing,
    Created,
    Running,
    Failing,
    Failed,
    Cancelling,
    Canceled,
    Finished,
    Restarting,
    Suspended,
    Reconciling,
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Initializing => "INITIALIZING",
            JobState::Created => "CREATED",
            JobState::Running => "RUNNING",
            JobState::Failing => "FAILING",
            JobState::Failed => "FAILED",
            JobState::Cancelling => "CANCELLING",
            JobState::Canceled => "CANCELED",
            JobState::Finished => "FINISHED",
            JobState::Restarting => "RESTARTING",
            JobState::Suspended => "SUSPENDED",
            JobState::Reconciling => "RECONCILING",
            JobState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job known to the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Cluster-assigned job id (`jid`)
    pub id: String,
    /// User-assigned base name, not unique across time
    pub name: String,
    pub state: JobState,
    pub start_time: DateTime<Utc>,
    /// `None` while the job has not ended
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Duration,
}

impl Job {
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

/// Status of an asynchronous savepoint operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavepointStatus {
    InProgress,
    Completed,
    /// Any status id the cluster reports besides the two above
    Other(String),
}

impl SavepointStatus {
    pub fn parse(id: &str) -> Self {
        match id {
            "IN_PROGRESS" => SavepointStatus::InProgress,
            "COMPLETED" => SavepointStatus::Completed,
            other => SavepointStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SavepointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavepointStatus::InProgress => f.write_str("IN_PROGRESS"),
            SavepointStatus::Completed => f.write_str("COMPLETED"),
            SavepointStatus::Other(id) => f.write_str(id),
        }
    }
}

/// Result of a single savepoint status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavepointPoll {
    pub status: SavepointStatus,
    /// Savepoint path, present once the operation completed successfully
    pub location: Option<String>,
    /// Failure description reported by the cluster, if any
    pub failure_cause: Option<String>,
}

impl SavepointPoll {
    pub fn in_progress() -> Self {
        Self {
            status: SavepointStatus::InProgress,
            location: None,
            failure_cause: None,
        }
    }

    pub fn completed(location: impl Into<String>) -> Self {
        Self {
            status: SavepointStatus::Completed,
            location: Some(location.into()),
            failure_cause: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_parsing() {
        let state: JobState = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(state, JobState::Running);

        let state: JobState = serde_json::from_str("\"CANCELED\"").unwrap();
        assert_eq!(state, JobState::Canceled);

        let state: JobState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, JobState::Unknown);
    }

    #[test]
    fn savepoint_status_parsing() {
        assert_eq!(SavepointStatus::parse("IN_PROGRESS"), SavepointStatus::InProgress);
        assert_eq!(SavepointStatus::parse("COMPLETED"), SavepointStatus::Completed);
        assert_eq!(
            SavepointStatus::parse("FAILED"),
            SavepointStatus::Other("FAILED".to_string())
        );
        assert_eq!(SavepointStatus::parse("FAILED").to_string(), "FAILED");
    }
}

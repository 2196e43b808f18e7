//! Wire formats of the Flink REST API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Job, JobState, SavepointPoll, SavepointStatus};

/// Response of `GET /jobs/overview`
#[derive(Debug, Deserialize, Serialize)]
pub struct JobsOverview {
    pub jobs: Vec<RawJob>,
}

/// Job entry as listed by the overview endpoint; times are epoch milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawJob {
    pub jid: String,
    pub name: String,
    pub state: JobState,
    pub start_time: i64,
    /// -1 while the job is still running
    pub end_time: i64,
    pub duration: i64,
}

impl From<RawJob> for Job {
    fn from(raw: RawJob) -> Self {
        let end_time = if raw.end_time < 0 {
            None
        } else {
            DateTime::<Utc>::from_timestamp_millis(raw.end_time)
        };

        Job {
            id: raw.jid,
            name: raw.name,
            state: raw.state,
            start_time: DateTime::<Utc>::from_timestamp_millis(raw.start_time).unwrap_or_default(),
            end_time,
            duration: Duration::from_millis(raw.duration.max(0) as u64),
        }
    }
}

/// Response of `POST /jars/upload`
#[derive(Debug, Deserialize, Serialize)]
pub struct UploadResponse {
    pub status: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl UploadResponse {
    /// The jar id: last path segment of the stored file name.
    pub fn jar_id(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

/// Response of `POST /jars/{jar_id}/run`
#[derive(Debug, Deserialize, Serialize)]
pub struct RunResponse {
    pub jobid: String,
}

/// Body of `POST /jobs/{job_id}/savepoints`
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerSavepointRequest {
    pub cancel_job: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_directory: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerSavepointResponse {
    pub request_id: String,
}

/// Response of `GET /jobs/{job_id}/savepoints/{request_id}`
#[derive(Debug, Deserialize, Serialize)]
pub struct SavepointStatusResponse {
    pub status: StatusId,
    #[serde(default)]
    pub operation: Option<SavepointOperation>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusId {
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SavepointOperation {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub failure_cause: Option<FailureCause>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FailureCause {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

impl FailureCause {
    fn describe(&self) -> String {
        // first line of the trace carries the exception message
        let summary = self
            .stack_trace
            .as_deref()
            .and_then(|trace| trace.lines().next())
            .map(str::trim)
            .filter(|line| !line.is_empty());

        match (summary, self.class.as_deref()) {
            (Some(line), _) => line.to_string(),
            (None, Some(class)) => class.to_string(),
            (None, None) => "unknown failure".to_string(),
        }
    }
}

impl From<SavepointStatusResponse> for SavepointPoll {
    fn from(raw: SavepointStatusResponse) -> Self {
        let (location, failure_cause) = match raw.operation {
            Some(op) => (op.location, op.failure_cause.map(|cause| cause.describe())),
            None => (None, None),
        };

        SavepointPoll {
            status: SavepointStatus::parse(&raw.status.id),
            location,
            failure_cause,
        }
    }
}

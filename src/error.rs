use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

/// Result type alias using [`DeployError`].
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised while talking to the cluster or sequencing a deployment
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Endpoint missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Request input rejected before any remote call
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure, or a read endpoint answered with a non-success status
    #[error("cannot reach cluster: {0}")]
    Connectivity(String),

    /// Jar file could not be read from disk
    #[error("failed to read jar file {}: {source}", path.display())]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload did not report success
    #[error("failed to upload jar file {}: {reason}", path.display())]
    Upload { path: PathBuf, reason: String },

    #[error("failed to run jar {artifact_id} ({status}): {body}")]
    Run {
        artifact_id: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to cancel job {job_id} ({status}): {body}")]
    Cancel {
        job_id: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to trigger savepoint for job {job_id} ({status}): {body}")]
    SavepointTrigger {
        job_id: String,
        status: StatusCode,
        body: String,
    },

    /// The savepoint operation ended in a state other than COMPLETED
    #[error("savepoint {request_id} for job {job_id} failed: {reason}")]
    SavepointFailed {
        job_id: String,
        request_id: String,
        reason: String,
    },

    /// The savepoint was still in progress when the wait budget ran out
    #[error("savepoint {request_id} for job {job_id} still in progress after {waited:?}")]
    SavepointTimeout {
        job_id: String,
        request_id: String,
        waited: Duration,
    },

    #[error("no running instance of job {0}")]
    NoRunningInstance(String),

    /// More than one running instance matches the job name
    #[error("{count} running instances of job {name}: {}", job_ids.join(", "))]
    AmbiguousJobState {
        name: String,
        count: usize,
        job_ids: Vec<String>,
    },

    /// The previous instance was cancelled but its replacement never started
    #[error("job {cancelled_job_id} was cancelled but no replacement is running: {source}")]
    ReplacementFailed {
        cancelled_job_id: String,
        #[source]
        source: Box<DeployError>,
    },
}

impl DeployError {
    /// Create a connectivity error.
    #[must_use]
    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when a savepoint did not complete, whether it failed or timed out.
    pub fn is_savepoint_incomplete(&self) -> bool {
        matches!(
            self,
            DeployError::SavepointFailed { .. } | DeployError::SavepointTimeout { .. }
        )
    }
}

impl From<validator::ValidationErrors> for DeployError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, "", &mut messages);
        messages.sort();
        DeployError::Validation(messages.join("; "))
    }
}

fn collect_messages(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = format!("{}{}", prefix, field);
        match kind {
            ValidationErrorsKind::Field(errors) => {
                out.extend(errors.iter().map(|e| match &e.message {
                    Some(message) => format!("{}: {}", path, message),
                    None => format!("{}: invalid value", path),
                }));
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_messages(nested, &format!("{}.", path), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(nested, &format!("{}[{}].", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savepoint_failure_and_timeout_are_both_incomplete() {
        let failed = DeployError::SavepointFailed {
            job_id: "j1".to_string(),
            request_id: "r1".to_string(),
            reason: "status FAILED".to_string(),
        };
        let timeout = DeployError::SavepointTimeout {
            job_id: "j1".to_string(),
            request_id: "r1".to_string(),
            waited: Duration::from_secs(60),
        };

        assert!(failed.is_savepoint_incomplete());
        assert!(timeout.is_savepoint_incomplete());
        assert!(!DeployError::NoRunningInstance("wc".to_string()).is_savepoint_incomplete());
    }

    #[test]
    fn ambiguous_state_lists_job_ids() {
        let err = DeployError::AmbiguousJobState {
            name: "wc-job".to_string(),
            count: 2,
            job_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "2 running instances of job wc-job: a, b");
    }

    #[test]
    fn replacement_failure_keeps_cause() {
        let err = DeployError::ReplacementFailed {
            cancelled_job_id: "old".to_string(),
            source: Box::new(DeployError::Upload {
                path: PathBuf::from("job.jar"),
                reason: "status error".to_string(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("job old was cancelled"));
        assert!(message.contains("failed to upload jar file job.jar"));
    }
}

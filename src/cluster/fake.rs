//! In-memory cluster used by unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;

use crate::deploy::params::DeployParams;
use crate::error::{DeployError, DeployResult};

use super::client::ClusterApi;
use super::models::{Job, JobState, SavepointPoll};

/// A remote call observed by [`FakeCluster`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListJobs,
    Upload(String),
    Run(String, DeployParams),
    Cancel(String),
    TriggerSavepoint(String, Option<String>),
    PollSavepoint(String, String),
}

#[derive(Default)]
struct Inner {
    jobs: Vec<Job>,
    polls: VecDeque<SavepointPoll>,
    calls: Vec<Call>,
    fail_upload: bool,
    fail_run: bool,
    fail_trigger: bool,
}

/// Scriptable [`ClusterApi`] that records every call
#[derive(Default)]
pub struct FakeCluster {
    inner: Mutex<Inner>,
}

pub fn job(id: &str, name: &str, state: JobState) -> Job {
    Job {
        id: id.to_string(),
        name: name.to_string(),
        state,
        start_time: Utc::now(),
        end_time: None,
        duration: Duration::from_secs(30),
    }
}

impl FakeCluster {
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let fake = Self::default();
        fake.inner.lock().unwrap().jobs = jobs;
        fake
    }

    /// Script savepoint polls; the last one repeats once the script runs out.
    pub fn polls(self, polls: Vec<SavepointPoll>) -> Self {
        self.inner.lock().unwrap().polls = polls.into();
        self
    }

    pub fn failing_upload(self) -> Self {
        self.inner.lock().unwrap().fail_upload = true;
        self
    }

    pub fn failing_run(self) -> Self {
        self.inner.lock().unwrap().fail_run = true;
        self
    }

    pub fn failing_trigger(self) -> Self {
        self.inner.lock().unwrap().fail_trigger = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn list_jobs(&self) -> DeployResult<Vec<Job>> {
        self.record(Call::ListJobs);
        Ok(self.inner.lock().unwrap().jobs.clone())
    }

    async fn upload_jar(&self, path: &Path) -> DeployResult<String> {
        self.record(Call::Upload(path.display().to_string()));
        if self.inner.lock().unwrap().fail_upload {
            return Err(DeployError::Upload {
                path: path.to_path_buf(),
                reason: "upload status error".to_string(),
            });
        }
        Ok("jar-1".to_string())
    }

    async fn run_jar(&self, jar_id: &str, params: &DeployParams) -> DeployResult<String> {
        self.record(Call::Run(jar_id.to_string(), params.clone()));
        if self.inner.lock().unwrap().fail_run {
            return Err(DeployError::Run {
                artifact_id: jar_id.to_string(),
                status: StatusCode::BAD_REQUEST,
                body: "entry class not found".to_string(),
            });
        }
        Ok("new-job".to_string())
    }

    async fn cancel_job(&self, job_id: &str) -> DeployResult<()> {
        self.record(Call::Cancel(job_id.to_string()));
        let mut inner = self.inner.lock().unwrap();
        for job in inner.jobs.iter_mut().filter(|job| job.id == job_id) {
            job.state = JobState::Canceled;
        }
        Ok(())
    }

    async fn trigger_savepoint(
        &self,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> DeployResult<String> {
        self.record(Call::TriggerSavepoint(
            job_id.to_string(),
            target_directory.map(str::to_string),
        ));
        if self.inner.lock().unwrap().fail_trigger {
            return Err(DeployError::SavepointTrigger {
                job_id: job_id.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            });
        }
        Ok("req-1".to_string())
    }

    async fn poll_savepoint(&self, job_id: &str, request_id: &str) -> DeployResult<SavepointPoll> {
        self.record(Call::PollSavepoint(job_id.to_string(), request_id.to_string()));
        let mut inner = self.inner.lock().unwrap();
        let poll = if inner.polls.len() > 1 {
            inner.polls.pop_front()
        } else {
            inner.polls.front().cloned()
        };
        Ok(poll.unwrap_or_else(SavepointPoll::in_progress))
    }
}

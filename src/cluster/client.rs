use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::deploy::params::DeployParams;
use crate::error::{DeployError, DeployResult};

use super::dto::{
    JobsOverview, RunResponse, SavepointStatusResponse, TriggerSavepointRequest,
    TriggerSavepointResponse, UploadResponse,
};
use super::models::{Job, SavepointPoll};

/// Remote operations of the cluster management API.
///
/// Every call is a single request with no retry; waiting on savepoints is
/// the job of [`crate::deploy::savepoint::SavepointCoordinator`].
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// All jobs known to the cluster, in any state.
    async fn list_jobs(&self) -> DeployResult<Vec<Job>>;

    /// Upload a jar and return the jar id assigned by the cluster.
    async fn upload_jar(&self, path: &Path) -> DeployResult<String>;

    /// Run an uploaded jar and return the new job id.
    async fn run_jar(&self, jar_id: &str, params: &DeployParams) -> DeployResult<String>;

    async fn cancel_job(&self, job_id: &str) -> DeployResult<()>;

    /// Start a savepoint without cancelling the job; returns the request id.
    async fn trigger_savepoint(
        &self,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> DeployResult<String>;

    /// Read the current status of a savepoint request once.
    async fn poll_savepoint(&self, job_id: &str, request_id: &str) -> DeployResult<SavepointPoll>;
}

/// HTTP client for the Flink REST API
#[derive(Debug, Clone)]
pub struct ClusterClient {
    client: Client,
    base_url: String,
}

impl ClusterClient {
    /// Create a client from configuration.
    ///
    /// Fails with a configuration error when no endpoint is configured or it
    /// is not a valid URL; no request is made here.
    pub fn new(config: &Config) -> DeployResult<Self> {
        let endpoint = config.endpoint()?;
        Url::parse(endpoint).map_err(|e| {
            DeployError::configuration(format!("invalid FLINK_BASE_URL {}: {}", endpoint, e))
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeployError::configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> DeployError {
    DeployError::connectivity(format!("{}: {}", url, err))
}

/// Read the status and body text of a response.
async fn read_body(response: Response, url: &str) -> DeployResult<(reqwest::StatusCode, String)> {
    let status = response.status();
    let body = response.text().await.map_err(|e| transport_error(url, e))?;
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(body: &str, url: &str) -> DeployResult<T> {
    serde_json::from_str(body)
        .map_err(|e| DeployError::connectivity(format!("unexpected response from {}: {}", url, e)))
}

/// GET a JSON document, treating any non-success status as a connectivity failure.
async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> DeployResult<T> {
    let response = client.get(url).send().await.map_err(|e| transport_error(url, e))?;
    let (status, body) = read_body(response, url).await?;
    if !status.is_success() {
        return Err(DeployError::connectivity(format!(
            "GET {} returned {}: {}",
            url, status, body
        )));
    }
    decode(&body, url)
}

#[async_trait]
impl ClusterApi for ClusterClient {
    async fn list_jobs(&self) -> DeployResult<Vec<Job>> {
        let url = self.url("/jobs/overview");
        let overview: JobsOverview = get_json(&self.client, &url).await?;
        debug!("Listed {} jobs", overview.jobs.len());
        Ok(overview.jobs.into_iter().map(Job::from).collect())
    }

    async fn upload_jar(&self, path: &Path) -> DeployResult<String> {
        // read fully so the file is closed before the request is sent
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| DeployError::ArtifactRead {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "job.jar".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let upload_error = |reason: String| DeployError::Upload {
            path: path.to_path_buf(),
            reason,
        };

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/x-java-archive")
            .map_err(|e| upload_error(e.to_string()))?;
        let form = Form::new().part("jarfile", part);

        let url = self.url("/jars/upload");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let (status, body) = read_body(response, &url).await?;
        if !status.is_success() {
            return Err(upload_error(format!("{}: {}", status, body)));
        }

        let data: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| upload_error(format!("unexpected response: {}", e)))?;
        if data.status != "success" {
            return Err(upload_error(format!("upload status {}", data.status)));
        }

        data.jar_id()
            .map(str::to_owned)
            .ok_or_else(|| upload_error("response carries no file name".to_string()))
    }

    async fn run_jar(&self, jar_id: &str, params: &DeployParams) -> DeployResult<String> {
        let url = self.url(&format!("/jars/{}/run", jar_id));
        let response = self
            .client
            .post(&url)
            .query(&params.to_query())
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let (status, body) = read_body(response, &url).await?;
        if !status.is_success() {
            return Err(DeployError::Run {
                artifact_id: jar_id.to_owned(),
                status,
                body,
            });
        }

        let data: RunResponse = decode(&body, &url)?;
        Ok(data.jobid)
    }

    async fn cancel_job(&self, job_id: &str) -> DeployResult<()> {
        let url = self.url(&format!("/jobs/{}", job_id));
        let response = self
            .client
            .patch(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let (status, body) = read_body(response, &url).await?;
        if !status.is_success() {
            return Err(DeployError::Cancel {
                job_id: job_id.to_owned(),
                status,
                body,
            });
        }
        Ok(())
    }

    async fn trigger_savepoint(
        &self,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> DeployResult<String> {
        let url = self.url(&format!("/jobs/{}/savepoints", job_id));
        let payload = TriggerSavepointRequest {
            cancel_job: false,
            target_directory: target_directory.map(str::to_owned),
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let (status, body) = read_body(response, &url).await?;
        if !status.is_success() {
            return Err(DeployError::SavepointTrigger {
                job_id: job_id.to_owned(),
                status,
                body,
            });
        }

        let data: TriggerSavepointResponse = decode(&body, &url)?;
        Ok(data.request_id)
    }

    async fn poll_savepoint(&self, job_id: &str, request_id: &str) -> DeployResult<SavepointPoll> {
        let url = self.url(&format!("/jobs/{}/savepoints/{}", job_id, request_id));
        let data: SavepointStatusResponse = get_json(&self.client, &url).await?;
        Ok(data.into())
    }
}

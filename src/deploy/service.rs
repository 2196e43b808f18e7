use tracing::{error, info, warn};

use crate::cluster::{ClusterApi, Job};
use crate::error::{DeployError, DeployResult};

use super::discovery::JobDiscovery;
use super::params::DeployRequest;
use super::savepoint::{SavepointCoordinator, SavepointPolicy};

/// Result of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Id of the newly started job, as returned by the cluster
    pub job_id: String,
    pub artifact_id: String,
    /// Previous instance that was cancelled, if any
    pub replaced_job_id: Option<String>,
    /// Savepoint the new job resumed from, if any
    pub resumed_from: Option<String>,
}

/// Deployment orchestration over a cluster
///
/// Concurrent deployments of the same job name are not coordinated here;
/// callers must serialise them.
pub struct DeployService<C: ClusterApi> {
    cluster: C,
    policy: SavepointPolicy,
}

impl<C: ClusterApi> DeployService<C> {
    /// Create a new DeployService instance
    pub fn new(cluster: C, policy: SavepointPolicy) -> Self {
        Self { cluster, policy }
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn discovery(&self) -> JobDiscovery<'_, C> {
        JobDiscovery::new(&self.cluster)
    }

    fn coordinator(&self) -> SavepointCoordinator<'_, C> {
        SavepointCoordinator::new(&self.cluster, self.policy)
    }

    /// Deploy a jar, replacing the running instance of the job if there is one
    ///
    /// # Business Logic
    /// - No running instance: upload and run
    /// - One running instance: savepoint it (unless the request names a
    ///   savepoint), cancel it, then upload and run resuming from the savepoint
    /// - Several running instances: refuse, nothing is touched
    ///
    /// A savepoint that fails or times out aborts before the old job is
    /// cancelled. Once it is cancelled, an upload or run failure is reported
    /// as `ReplacementFailed` since the job is then left without a replacement.
    pub async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployOutcome> {
        request.check()?;
        let mut params = request.params.clone();

        let running = self.discovery().find_running_by_name(&request.name).await?;

        let replaced_job_id = match running.as_slice() {
            [] => {
                info!(
                    "No instance running for job {}. Starting a new deployment.",
                    request.name
                );
                None
            }
            [current] => {
                let job_id = current.id.clone();

                if request.has_explicit_savepoint() {
                    info!(
                        "Using supplied savepoint for job {}, skipping savepoint creation",
                        job_id
                    );
                } else {
                    info!("Creating savepoint for job {}", job_id);
                    let location = self
                        .coordinator()
                        .create_savepoint(&job_id, None)
                        .await
                        .inspect_err(|e| {
                            if e.is_savepoint_incomplete() {
                                error!("Error on savepoint creation ({}). Aborting deployment.", e)
                            } else {
                                error!(
                                    "Could not start savepoint for job {} ({}). Aborting deployment.",
                                    job_id, e
                                )
                            }
                        })?;
                    params.savepoint_path = Some(location);
                }

                self.cluster.cancel_job(&job_id).await?;
                info!("Job {} cancelled", job_id);
                Some(job_id)
            }
            many => return Err(ambiguous(&request.name, many)),
        };

        let left_jobless = |source: DeployError| match &replaced_job_id {
            Some(cancelled) => {
                error!(
                    "Job {} was cancelled and has no running replacement",
                    cancelled
                );
                DeployError::ReplacementFailed {
                    cancelled_job_id: cancelled.clone(),
                    source: Box::new(source),
                }
            }
            None => source,
        };

        info!("Uploading jar to Flink...");
        let artifact_id = self
            .cluster
            .upload_jar(&request.jar_file)
            .await
            .map_err(left_jobless)?;
        info!("Jar file uploaded! JarId: {}", artifact_id);

        info!("Deploying job with params: {:?}", params.to_query());
        let job_id = self
            .cluster
            .run_jar(&artifact_id, &params)
            .await
            .map_err(left_jobless)?;
        info!("Deploy completed with jar id {}: job {}", artifact_id, job_id);

        Ok(DeployOutcome {
            job_id,
            artifact_id,
            replaced_job_id,
            resumed_from: params.savepoint_path,
        })
    }

    /// Take a savepoint of the single running instance of `job_base_name`
    ///
    /// The job keeps running; nothing is cancelled or redeployed.
    pub async fn trigger_savepoint(
        &self,
        job_base_name: &str,
        savepoint_path: Option<&str>,
    ) -> DeployResult<String> {
        let running = self.discovery().find_running_by_name(job_base_name).await?;

        match running.as_slice() {
            [] => {
                warn!("No running jobs for basename {}", job_base_name);
                Err(DeployError::NoRunningInstance(job_base_name.to_owned()))
            }
            [job] => self.coordinator().create_savepoint(&job.id, savepoint_path).await,
            many => Err(ambiguous(job_base_name, many)),
        }
    }
}

fn ambiguous(name: &str, jobs: &[Job]) -> DeployError {
    warn!("{} running instances of {}, refusing to pick one", jobs.len(), name);
    DeployError::AmbiguousJobState {
        name: name.to_owned(),
        count: jobs.len(),
        job_ids: jobs.iter().map(|job| job.id.clone()).collect(),
    }
}

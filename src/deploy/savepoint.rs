use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::cluster::{ClusterApi, SavepointStatus};
use crate::config::Config;
use crate::error::{DeployError, DeployResult};

/// How long to wait for a savepoint and how often to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavepointPolicy {
    pub poll_interval: Duration,
    /// Wall-clock budget measured from the first poll
    pub timeout: Duration,
}

impl Default for SavepointPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(60),
        }
    }
}

impl SavepointPolicy {
    /// The instant one `timeout` after `start`; a configuration error when the
    /// clock cannot represent it.
    fn deadline_from(&self, start: Instant) -> DeployResult<Instant> {
        start.checked_add(self.timeout).ok_or_else(|| {
            DeployError::configuration(format!(
                "savepoint timeout of {}s is out of range",
                self.timeout.as_secs()
            ))
        })
    }
}

impl From<&Config> for SavepointPolicy {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.savepoint_poll_interval,
            timeout: config.savepoint_timeout,
        }
    }
}

/// Drives a savepoint from trigger to a terminal outcome
///
/// `TRIGGERED -> POLLING -> {COMPLETED, FAILED, TIMED_OUT}`. Only an
/// IN_PROGRESS status keeps the loop polling; any other status ends it.
pub struct SavepointCoordinator<'a, C: ClusterApi> {
    cluster: &'a C,
    policy: SavepointPolicy,
}

impl<'a, C: ClusterApi> SavepointCoordinator<'a, C> {
    pub fn new(cluster: &'a C, policy: SavepointPolicy) -> Self {
        Self { cluster, policy }
    }

    /// Trigger a savepoint for `job_id` and wait for its location.
    ///
    /// # Returns
    /// - `Ok(location)` - savepoint completed
    /// - `Err(SavepointTrigger)` - the cluster refused the trigger
    /// - `Err(SavepointFailed)` - terminal status other than COMPLETED, or COMPLETED without a location
    /// - `Err(SavepointTimeout)` - still IN_PROGRESS when the budget ran out
    pub async fn create_savepoint(
        &self,
        job_id: &str,
        target_directory: Option<&str>,
    ) -> DeployResult<String> {
        // nothing reaches the cluster with a budget the loop cannot honour
        self.policy.deadline_from(Instant::now())?;

        let request_id = self
            .cluster
            .trigger_savepoint(job_id, target_directory)
            .await?;
        info!("Savepoint triggered for job {}: request_id={}", job_id, request_id);

        let started = Instant::now();
        let deadline = self.policy.deadline_from(started)?;

        loop {
            let poll = self.cluster.poll_savepoint(job_id, &request_id).await?;

            match poll.status {
                SavepointStatus::InProgress => {
                    let now = Instant::now();
                    if now >= deadline {
                        let waited = now - started;
                        warn!(
                            "Timeout on savepoint {} for job {} after {:?}",
                            request_id, job_id, waited
                        );
                        return Err(DeployError::SavepointTimeout {
                            job_id: job_id.to_owned(),
                            request_id,
                            waited,
                        });
                    }

                    info!("Savepoint in progress...");
                    sleep(self.policy.poll_interval.min(deadline - now)).await;
                }
                SavepointStatus::Completed => {
                    return match poll.location {
                        Some(location) => {
                            info!("Savepoint completed: {}", location);
                            Ok(location)
                        }
                        None => {
                            let reason = poll
                                .failure_cause
                                .unwrap_or_else(|| "completed without a location".to_string());
                            error!("Savepoint {} for job {} failed: {}", request_id, job_id, reason);
                            Err(DeployError::SavepointFailed {
                                job_id: job_id.to_owned(),
                                request_id,
                                reason,
                            })
                        }
                    };
                }
                SavepointStatus::Other(status) => {
                    let reason = match poll.failure_cause {
                        Some(cause) => format!("status {}: {}", status, cause),
                        None => format!("status {}", status),
                    };
                    error!("Savepoint {} for job {} failed: {}", request_id, job_id, reason);
                    return Err(DeployError::SavepointFailed {
                        job_id: job_id.to_owned(),
                        request_id,
                        reason,
                    });
                }
            }
        }
    }
}

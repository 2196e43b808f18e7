use tracing::debug;

use crate::cluster::{ClusterApi, Job};
use crate::error::DeployResult;

/// Finds running jobs on the cluster
pub struct JobDiscovery<'a, C: ClusterApi> {
    cluster: &'a C,
}

impl<'a, C: ClusterApi> JobDiscovery<'a, C> {
    pub fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    /// Every job the cluster reports, in any state
    pub async fn list_all(&self) -> DeployResult<Vec<Job>> {
        self.cluster.list_jobs().await
    }

    /// All jobs currently in the RUNNING state
    pub async fn list_running(&self) -> DeployResult<Vec<Job>> {
        let jobs = self.list_all().await?;
        Ok(jobs.into_iter().filter(Job::is_running).collect())
    }

    /// Running jobs whose name is exactly `name`
    ///
    /// May return zero, one or several jobs; callers decide what each case means.
    pub async fn find_running_by_name(&self, name: &str) -> DeployResult<Vec<Job>> {
        let matching: Vec<Job> = self
            .list_running()
            .await?
            .into_iter()
            .filter(|job| job.name == name)
            .collect();
        debug!("Found {} running instances of {}", matching.len(), name);
        Ok(matching)
    }
}

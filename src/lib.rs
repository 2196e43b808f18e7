//! Redeploy Flink jobs through the cluster's REST API, carrying state over
//! with a savepoint.

pub mod cluster;
pub mod config;
pub mod deploy;
pub mod error;
pub mod output;

pub use error::{DeployError, DeployResult};

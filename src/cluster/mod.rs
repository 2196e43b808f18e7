pub mod client;
pub mod dto;
pub mod models;

#[cfg(test)]
pub mod fake;

// Re-export commonly used types
pub use client::{ClusterApi, ClusterClient};
pub use models::{Job, JobState, SavepointPoll, SavepointStatus};

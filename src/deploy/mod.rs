pub mod discovery;
pub mod params;
pub mod savepoint;
pub mod service;

// Re-export commonly used types
pub use discovery::JobDiscovery;
pub use params::{DeployParams, DeployRequest};
pub use savepoint::{SavepointCoordinator, SavepointPolicy};
pub use service::{DeployOutcome, DeployService};

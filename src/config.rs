use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DeployError, DeployResult};

/// Default HTTP timeout per cluster request (seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Default wall-clock budget for a savepoint (seconds)
const DEFAULT_SAVEPOINT_TIMEOUT_SECS: u64 = 60;
/// Default delay between savepoint status polls (milliseconds)
const DEFAULT_SAVEPOINT_POLL_INTERVAL_MS: u64 = 500;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the Flink REST API, e.g. http://jobmanager:8081
    pub base_url: Option<String>,

    /// Timeout applied to every HTTP request
    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// Total time allowed for a savepoint to complete
    /// Default: 60 seconds
    pub savepoint_timeout: Duration,

    /// Delay between savepoint status polls
    /// Default: 500 milliseconds
    pub savepoint_poll_interval: Duration,

    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Required by every command (checked when the client is built):
    /// - FLINK_BASE_URL: Flink REST endpoint
    ///
    /// Optional environment variables:
    /// - FLINK_REQUEST_TIMEOUT_SECS: per-request timeout (default: 30)
    /// - SAVEPOINT_TIMEOUT_SECS: savepoint wait budget (default: 60)
    /// - SAVEPOINT_POLL_INTERVAL_MS: delay between savepoint polls, above zero (default: 500)
    /// - LOG_DIR: write daily rolling log files into this directory
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("FLINK_BASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let parse_u64 = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let request_timeout = Duration::from_secs(parse_u64(
            "FLINK_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let savepoint_timeout = Duration::from_secs(parse_u64(
            "SAVEPOINT_TIMEOUT_SECS",
            DEFAULT_SAVEPOINT_TIMEOUT_SECS,
        ));
        // zero is treated as malformed
        let savepoint_poll_interval = Duration::from_millis(
            lookup("SAVEPOINT_POLL_INTERVAL_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|&ms| ms > 0)
                .unwrap_or(DEFAULT_SAVEPOINT_POLL_INTERVAL_MS),
        );

        let log_dir = lookup("LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Config {
            base_url,
            request_timeout,
            savepoint_timeout,
            savepoint_poll_interval,
            log_dir,
        }
    }

    /// Configuration pointing at `base_url` with every other setting at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self::from_lookup(move |key| (key == "FLINK_BASE_URL").then(|| base_url.clone()))
    }

    /// The configured endpoint, or a configuration error when it is missing.
    pub fn endpoint(&self) -> DeployResult<&str> {
        self.base_url.as_deref().ok_or_else(|| {
            DeployError::configuration("FLINK_BASE_URL must be set in .env file or environment")
        })
    }
}

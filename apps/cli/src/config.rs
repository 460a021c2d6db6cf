//! Environment configuration for the command line.

use std::time::Duration;

use fxrate_market_data::config::{
    DEFAULT_AGGREGATE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SOURCE_TIMEOUT, DEFAULT_USER_AGENT,
};
use fxrate_market_data::FetchConfig;

pub const ENV_REQUEST_TIMEOUT: &str = "FXRATE_REQUEST_TIMEOUT_SECS";
pub const ENV_SOURCE_TIMEOUT: &str = "FXRATE_SOURCE_TIMEOUT_SECS";
pub const ENV_AGGREGATE_TIMEOUT: &str = "FXRATE_AGGREGATE_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "FXRATE_USER_AGENT";

#[derive(Clone, Debug)]
pub struct Config {
    pub request_timeout: Duration,
    pub source_timeout: Duration,
    pub aggregate_timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Read settings from the process environment. Invalid values fall back
    /// to the defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let seconds = |key: &str, default: Duration| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        "Ignoring {}={:?}: expected a positive number of seconds",
                        key,
                        raw
                    );
                    default
                }
            },
        };

        Self {
            request_timeout: seconds(ENV_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT),
            source_timeout: seconds(ENV_SOURCE_TIMEOUT, DEFAULT_SOURCE_TIMEOUT),
            aggregate_timeout: seconds(ENV_AGGREGATE_TIMEOUT, DEFAULT_AGGREGATE_TIMEOUT),
            user_agent: lookup(ENV_USER_AGENT)
                .map(|ua| ua.trim().to_string())
                .filter(|ua| !ua.is_empty())
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_request_timeout(self.request_timeout)
            .with_source_timeout(self.source_timeout)
            .with_aggregate_timeout(self.aggregate_timeout)
            .with_user_agent(self.user_agent.clone())
    }
}

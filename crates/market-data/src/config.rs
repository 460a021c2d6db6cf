//! Fetch configuration shared by all source adapters.

use std::time::Duration;

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// Default per-source deadline inside an aggregation.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default overall aggregation deadline.
pub const DEFAULT_AGGREGATE_TIMEOUT: Duration = Duration::from_secs(20);

/// User agent sent to every upstream.
pub const DEFAULT_USER_AGENT: &str = "fxrate/0.3";

/// Timeouts and transport settings.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fxrate_market_data::FetchConfig;
///
/// let config = FetchConfig::default().with_source_timeout(Duration::from_secs(5));
/// assert_eq!(config.source_timeout, Duration::from_secs(5));
/// ```
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Client-level timeout for a single HTTP request.
    pub request_timeout: Duration,

    /// Deadline for one source inside an aggregation. Clamped to
    /// `aggregate_timeout` at scheduling time.
    pub source_timeout: Duration,

    /// Deadline for a whole aggregation call.
    pub aggregate_timeout: Duration,

    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            aggregate_timeout: DEFAULT_AGGREGATE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn with_aggregate_timeout(mut self, timeout: Duration) -> Self {
        self.aggregate_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-source deadline, never longer than the aggregation deadline.
    pub fn effective_source_timeout(&self) -> Duration {
        self.source_timeout.min(self.aggregate_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.source_timeout, Duration::from_secs(10));
        assert_eq!(config.aggregate_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_source_timeout_clamped_to_aggregate() {
        let config = FetchConfig::default()
            .with_source_timeout(Duration::from_secs(30))
            .with_aggregate_timeout(Duration::from_secs(5));
        assert_eq!(config.effective_source_timeout(), Duration::from_secs(5));
    }
}

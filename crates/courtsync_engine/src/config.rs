//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote blob endpoint.
    pub base_url: String,
    /// Bucket path segment under the base URL.
    pub bucket: String,
    /// Hard per-request timeout.
    pub timeout: Duration,
    /// Interval between scheduled pulls.
    pub pull_interval: Duration,
    /// Quiet window after a local mutation before a push fires.
    pub push_debounce: Duration,
    /// Settle window after adopting a remote snapshot, during which
    /// mutation observers must not arm a push.
    pub settle_delay: Duration,
    /// Cap on the pull-interval backoff multiplier under repeated
    /// transient failures.
    pub max_backoff_factor: u32,
}

impl SyncConfig {
    /// Creates a configuration against the given endpoint and bucket.
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            timeout: Duration::from_secs(10),
            pull_interval: Duration::from_secs(30),
            push_debounce: Duration::from_millis(1500),
            settle_delay: Duration::from_secs(2),
            max_backoff_factor: 8,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the scheduled pull interval.
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }

    /// Sets the push debounce window.
    pub fn with_push_debounce(mut self, debounce: Duration) -> Self {
        self.push_debounce = debounce;
        self
    }

    /// Sets the post-adoption settle window.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the backoff factor cap.
    pub fn with_max_backoff_factor(mut self, factor: u32) -> Self {
        self.max_backoff_factor = factor.max(1);
        self
    }

    /// The remote resource URL for a normalized identifier.
    pub fn resource_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("https://kvdb.io", "courtsync")
    }
}

//! Engine configuration.

use std::time::Duration;

use crate::index::RetryPolicy;
use crate::planner::ScanPolicy;

/// Tunables for one engine instance; collections created by the engine
/// inherit its configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page size when the caller does not pass a limit
    pub default_limit: usize,
    /// Hard upper bound on any requested page size
    pub max_limit: usize,
    /// How long `refresh` waits for the index queues to drain
    pub refresh_timeout: Duration,
    /// Bounded pool: index-update tasks running at once, engine-wide
    pub index_workers: usize,
    /// Retry policy for failed index-update applications
    pub apply_retry: RetryPolicy,
    /// Whether plans may fall back to full collection scans
    pub scan_policy: ScanPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
            refresh_timeout: Duration::from_secs(5),
            index_workers: 4,
            apply_retry: RetryPolicy::default(),
            scan_policy: ScanPolicy::Allow,
        }
    }
}

impl EngineConfig {
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_index_workers(mut self, workers: usize) -> Self {
        self.index_workers = workers;
        self
    }

    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.scan_policy = policy;
        self
    }
}

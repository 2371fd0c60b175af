use std::sync::Arc;
use std::time::Duration;

use crate::catalog::ItemCatalog;
use crate::config::LauncherConfig;
use crate::model::Epoch;

/// How often a failed import is retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per descriptor, first load included. `None` is unlimited.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        Self { max_attempts: None }
    }

    pub fn capped(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    /// Whether a request that just failed on `attempt` may be tried again.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub retry_interval: Duration,
    pub max_concurrent_loads: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(10),
            max_concurrent_loads: 8,
            retry_policy: RetryPolicy::unlimited(),
        }
    }
}

impl CoordinatorOptions {
    pub fn from_config(config: &LauncherConfig) -> Self {
        Self {
            retry_interval: config.retry_interval(),
            max_concurrent_loads: config.max_concurrent_loads(),
            retry_policy: RetryPolicy {
                max_attempts: config.retry.max_attempts,
            },
        }
    }
}

/// State published by the coordinator after every change.
#[derive(Debug, Clone)]
pub struct CoordinatorSnapshot {
    pub epoch: Epoch,
    pub catalog: Arc<ItemCatalog>,
    pub in_flight: usize,
    pub pending_retries: usize,
}

impl CoordinatorSnapshot {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            catalog: Arc::new(ItemCatalog::new(epoch)),
            in_flight: 0,
            pending_retries: 0,
        }
    }

    /// No load of the current epoch is outstanding. Queued retries do not count.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }
}

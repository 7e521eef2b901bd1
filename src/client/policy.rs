use std::time::Duration;

use crate::config::{RetryConfig, MAX_RETRIES_LIMIT};
use crate::types::CompletionFailure;

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Retry policy for a single completion call.
///
/// Important constraints:
/// - At most one retry, and only for transient failures (transport, 5xx).
/// - 4xx and contract failures are reported immediately.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.min(MAX_RETRIES_LIMIT),
            delay: Duration::from_millis(config.delay_ms),
        }
    }

    /// `attempt` is zero-based: the first call is attempt 0.
    pub fn decide(&self, attempt: u32, failure: &CompletionFailure) -> Decision {
        if attempt >= self.max_retries || !failure.is_transient() {
            return Decision::Fail;
        }
        Decision::Retry { delay: self.delay }
    }
}

//! Poll driver for stack operations
//!
//! Calls [`StackStatus::from_describe`] at a fixed interval until a terminal
//! status. The driver owns the integration points the status function must
//! not know about: the sleep, the caller's cancellation token and an optional
//! deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stratus_common::{Error, Result};

use super::status::{StackOperation, StackStatus};
use crate::client::StackClient;

/// Default delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Polling behaviour for create and update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay between status checks (no backoff, no jitter)
    pub interval: Duration,
    /// Give up after this long; `None` polls until a terminal status
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl PollConfig {
    /// Poll with the default interval, giving up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

/// Poll `stack` until `operation` reaches a terminal status.
///
/// Transport failures during a poll are fatal; a single failed describe is
/// not retried. With a timeout, the last sleep is cut short at the deadline
/// and no describe is issued after it.
pub async fn wait_for_stack(
    client: &dyn StackClient,
    config: &PollConfig,
    cancel: Option<&CancellationToken>,
    operation: StackOperation,
    stack: &str,
) -> Result<()> {
    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        polls += 1;
        let stacks = client
            .describe_stacks(stack)
            .await
            .map_err(|e| Error::transport("DescribeStacks", e))?;

        match StackStatus::from_describe(operation, stack, &stacks)? {
            StackStatus::Succeeded => {
                info!(stack = %stack, %operation, polls, "stack operation complete");
                return Ok(());
            }
            StackStatus::Failed { status, reason } => {
                warn!(
                    stack = %stack,
                    %operation,
                    status = %status,
                    reason = %reason,
                    "stack operation failed"
                );
                return Err(Error::provisioning_failed(stack, status, reason));
            }
            StackStatus::NotFound => {
                return Err(Error::StackNotFound {
                    stack: stack.to_string(),
                })
            }
            StackStatus::Pending => {
                debug!(stack = %stack, %operation, polls, "stack operation in progress");
            }
        }

        let delay = match config.timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(start.elapsed());
                if remaining.is_zero() {
                    return Err(timed_out(stack, start));
                }
                remaining.min(config.interval)
            }
            None => config.interval,
        };

        pause(delay, cancel, stack).await?;

        if config.timeout.is_some_and(|timeout| start.elapsed() >= timeout) {
            return Err(timed_out(stack, start));
        }
    }
}

fn timed_out(stack: &str, start: Instant) -> Error {
    let elapsed = start.elapsed();
    warn!(stack = %stack, ?elapsed, "gave up waiting for stack");
    Error::Timeout {
        stack: stack.to_string(),
        elapsed,
    }
}

/// Sleep for `interval`, returning early if the caller cancels.
async fn pause(interval: Duration, cancel: Option<&CancellationToken>, stack: &str) -> Result<()> {
    let Some(token) = cancel else {
        tokio::time::sleep(interval).await;
        return Ok(());
    };

    tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(stack = %stack, "polling cancelled");
            Err(Error::Cancelled { stack: stack.to_string() })
        }
        _ = tokio::time::sleep(interval) => Ok(()),
    }
}

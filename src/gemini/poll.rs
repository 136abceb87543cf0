//! Polling policy and sleep abstraction for long-running video jobs.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::VideoSettings;

/// Default interval between status checks (20 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Default cap on the total time spent waiting for a job (10 minutes).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Something that can suspend the current task.
///
/// Production code uses [`TokioSleeper`]. Tests substitute an implementation
/// that returns immediately and records the requested delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How often to poll an operation and when to give up on it.
///
/// Elapsed time is the sum of the intervals slept so far, so an injected
/// sleeper fully controls the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl From<&VideoSettings> for PollPolicy {
    fn from(settings: &VideoSettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            max_wait: settings.max_wait(),
        }
    }
}

impl PollPolicy {
    /// Whether another sleep is allowed after `polls` status checks.
    ///
    /// A zero interval never advances the clock, so it allows no polls at all.
    pub fn should_continue(&self, polls: u32) -> bool {
        !self.interval.is_zero() && self.waited(polls) < self.max_wait
    }

    /// Time accounted for after `polls` sleeps.
    pub fn waited(&self, polls: u32) -> Duration {
        self.interval.saturating_mul(polls)
    }
}

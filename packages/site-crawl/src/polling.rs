//! Bounded-retry polling.
//!
//! [`poll_until_terminal`] drives any status check until a terminal
//! predicate holds or the attempt budget runs out. It never errors: a failed
//! check uses up an attempt, and an exhausted budget comes back as
//! [`PollOutcome::Exhausted`] with the last answer that did arrive.
//!
//! The wait between checks goes through [`Sleeper`] so tests can run the
//! loop without real time passing.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::types::config::PollConfig;
use crate::types::status::{CrawlStatus, JobStatus};

/// Non-terminal answers between `info` heartbeats.
pub const HEARTBEAT_EVERY: u32 = 6;

/// Suspends the poller between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How a polling sequence ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The predicate held for `response`.
    Terminal { response: T, attempts: u32 },

    /// Budget used up. `last` is the most recent successful answer.
    Exhausted {
        last: Option<T>,
        last_error: Option<String>,
        attempts: u32,
    },
}

impl<T> PollOutcome<T> {
    /// Status checks made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Terminal { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Call `check` until `is_terminal` holds, at most `config.attempts()` times.
///
/// Checks are strictly sequential. Between two checks the poller waits
/// `config.delay`; there is no wait before the first check or after the
/// last, so the loop sleeps at most `config.max_wait()` in total.
pub async fn poll_until_terminal<T, E, F, Fut, P>(
    mut check: F,
    is_terminal: P,
    config: PollConfig,
    sleeper: &dyn Sleeper,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&T) -> bool,
{
    let max_attempts = config.attempts();
    let mut last = None;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match check().await {
            Ok(response) if is_terminal(&response) => {
                return PollOutcome::Terminal {
                    response,
                    attempts: attempt,
                };
            }
            Ok(response) => {
                if attempt % HEARTBEAT_EVERY == 0 {
                    info!(attempt, max_attempts, "Still waiting for a terminal status");
                } else {
                    debug!(attempt, max_attempts, "Not terminal yet");
                }
                last = Some(response);
            }
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "Status check failed, counting as attempt");
                last_error = Some(e.to_string());
            }
        }

        if attempt < max_attempts {
            sleeper.sleep(config.delay).await;
        }
    }

    PollOutcome::Exhausted {
        last,
        last_error,
        attempts: max_attempts,
    }
}

/// Collapse a job polling outcome into one status.
///
/// An exhausted budget becomes a synthesized `Timeout` that keeps whatever
/// partial data and progress the last answer carried.
pub fn resolve_job_status(outcome: PollOutcome<JobStatus>) -> JobStatus {
    match outcome {
        PollOutcome::Terminal { response, .. } => response,
        PollOutcome::Exhausted {
            last,
            last_error,
            attempts,
        } => {
            let mut message = format!("job did not finish within {attempts} status checks");
            if let Some(e) = last_error {
                message.push_str(&format!(" (last error: {e})"));
            }

            let mut status = JobStatus::new(CrawlStatus::Timeout).with_error(message);
            if let Some(last) = last {
                status.data = last.data;
                status.completed = last.completed;
                status.total = last.total;
            }

            info!(
                attempts,
                has_partial_data = status.has_data(),
                "Polling budget exhausted"
            );
            status
        }
    }
}

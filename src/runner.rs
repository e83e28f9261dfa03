//! Sequential batch runner with inter-job pacing.
//!
//! Jobs run strictly one after another in submission order, and the runner waits
//! `inter_job_delay_ms` between consecutive jobs. Launches are never issued concurrently, so
//! the upstream rate limit sees at most one launch in flight from a batch.
//!
//! Every request yields exactly one [`BatchJobResult`], in input order. A remote launcher
//! that raises, or panics, only fails its own job; the batch continues with the next request.
//!
//! The run does no work outside the future returned by [`BatchRunner::run`]. Dropping that
//! future (for example on a timeout) stops the batch and no further launches are sent.

use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::{BatchJobResult, LaunchOutcome, LaunchRequest};
use crate::error::{LaunchpadError, Result};
use crate::launcher::RemoteLauncher;
use crate::retry::{LaunchAttempts, RetryConfig, RetryingLauncher};
use crate::summary::summarize;

/// Error recorded for jobs skipped because the run was cancelled.
pub const CANCELLED_ERROR: &str = "launch cancelled";

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Retry policy applied to each job
    pub retry: RetryConfig,

    /// How long to wait between the end of one job and the start of the next
    pub inter_job_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            inter_job_delay_ms: 5000,
        }
    }
}

/// Drives launch requests through a [`RetryingLauncher`] one at a time.
pub struct BatchRunner<L: RemoteLauncher> {
    launcher: RetryingLauncher<L>,
    inter_job_delay: Duration,
    cancellation: CancellationToken,
}

impl<L: RemoteLauncher> BatchRunner<L> {
    /// Create a runner. Cancelling `cancellation` stops the run at the next suspension point.
    ///
    /// # Errors
    /// Returns [`LaunchpadError::InvalidConfig`] if the retry policy is invalid.
    pub fn new(remote: L, config: RunnerConfig, cancellation: CancellationToken) -> Result<Self> {
        let launcher = RetryingLauncher::new(remote, config.retry, cancellation.clone())?;
        Ok(Self {
            launcher,
            inter_job_delay: Duration::from_millis(config.inter_job_delay_ms),
            cancellation,
        })
    }

    /// Launch every request in order and return one result per request, in the same order.
    ///
    /// If the run is cancelled, the job in progress keeps the outcome it had reached and every
    /// remaining request is reported as failed with [`CANCELLED_ERROR`] without being sent.
    #[tracing::instrument(skip_all, fields(jobs = requests.len()))]
    pub async fn run(&self, requests: Vec<LaunchRequest>) -> Vec<BatchJobResult> {
        let total = requests.len();
        let mut results = Vec::with_capacity(total);

        tracing::info!(
            jobs = total,
            inter_job_delay_ms = self.inter_job_delay.as_millis() as u64,
            "Starting batch"
        );

        let mut requests = requests.into_iter().enumerate().peekable();
        while let Some((index, request)) = requests.next() {
            if self.cancellation.is_cancelled() {
                results.push(cancelled_result(request));
                continue;
            }

            tracing::info!(
                job = index + 1,
                jobs = total,
                launch_id = %request.id(),
                name = %request.name(),
                "Launching token"
            );
            results.push(self.run_job(request).await);

            if requests.peek().is_some() {
                self.pace().await;
            }
        }

        let summary = summarize(&results);
        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            "Batch finished"
        );

        results
    }

    /// Wait out the inter-job delay unless the run is cancelled first.
    async fn pace(&self) {
        if self.inter_job_delay.is_zero() {
            return;
        }
        tracing::debug!(
            delay_ms = self.inter_job_delay.as_millis() as u64,
            "Waiting before next launch"
        );
        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => {
                tracing::info!("Cancellation received, skipping remaining launches");
            }
            _ = tokio::time::sleep(self.inter_job_delay) => {}
        }
    }

    async fn run_job(&self, request: LaunchRequest) -> BatchJobResult {
        let started_at = Utc::now();

        // Awaited inline so dropping the run future stops the launch with it.
        let attempts = match self.launcher.launch_with_history(&request).await {
            Ok(attempts) => attempts,
            Err(LaunchpadError::Cancelled) => return cancelled_result(request),
            Err(LaunchpadError::RemoteError {
                attempt,
                prior_errors,
                source,
            }) => {
                tracing::error!(
                    launch_id = %request.id(),
                    attempt,
                    error = %format!("{:#}", source),
                    "Unexpected error launching token, continuing with batch"
                );
                LaunchAttempts {
                    outcome: LaunchOutcome::failed(format!("{:#}", source)),
                    attempts: attempt,
                    prior_errors,
                }
            }
            Err(e) => {
                tracing::error!(launch_id = %request.id(), error = %e, "Unexpected error launching token");
                LaunchAttempts {
                    outcome: LaunchOutcome::failed(e.to_string()),
                    attempts: 0,
                    prior_errors: Vec::new(),
                }
            }
        };

        let status = if attempts.outcome.success() {
            "launched"
        } else {
            "failed"
        };
        counter!("launchpad_launches_total", "status" => status).increment(1);

        BatchJobResult {
            request,
            outcome: attempts.outcome,
            attempts: attempts.attempts,
            prior_errors: attempts.prior_errors,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

fn cancelled_result(request: LaunchRequest) -> BatchJobResult {
    tracing::debug!(launch_id = %request.id(), "Skipping launch (cancelled)");
    counter!("launchpad_launches_total", "status" => "cancelled").increment(1);
    let now = Utc::now();
    BatchJobResult {
        request,
        outcome: LaunchOutcome::failed(CANCELLED_ERROR),
        attempts: 0,
        prior_errors: Vec::new(),
        started_at: now,
        finished_at: now,
    }
}

//! Bounded retry around a single remote launch.
//!
//! [`RetryingLauncher`] calls the remote launcher until it reports success or the attempt
//! budget runs out. Between attempts it sleeps for a backoff that grows with the attempt
//! number: `backoff_ms * attempt`, so the defaults wait 2s, 4s, 6s, ...
//!
//! ```text
//! attempt 1 ──fail──> sleep(1 × backoff) ──> attempt 2 ──fail──> sleep(2 × backoff) ──> ...
//!     │                                          │
//!     └──success──> return                       └──success──> return
//!
//! attempt N ──fail──> return last failure (no sleep)
//! ```
//!
//! Only the remote call and the backoff sleep suspend. The cancellation token is checked
//! before the first call and raced against every sleep; a call that has started always runs
//! to completion.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::domain::{LaunchOutcome, LaunchRequest};
use crate::error::{LaunchpadError, Result};
use crate::launcher::RemoteLauncher;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per launch, including the first (must be at least 1)
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; the wait after attempt `n` is `n * backoff_ms`
    pub backoff_ms: u64,

    /// Upper bound on a single wait in milliseconds
    pub max_backoff_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
            max_backoff_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(LaunchpadError::invalid("max_attempts", "must be at least 1"));
        }
        Ok(())
    }

    /// Wait inserted after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let linear = self.backoff_ms.saturating_mul(u64::from(attempt));
        let capped = match self.max_backoff_ms {
            Some(max) => linear.min(max),
            None => linear,
        };
        Duration::from_millis(capped)
    }
}

/// Final outcome of a launch together with what it took to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAttempts {
    /// First success, or the last failure
    pub outcome: LaunchOutcome,
    /// Number of remote calls made
    pub attempts: u32,
    /// Errors of the failed attempts before the final one, oldest first
    pub prior_errors: Vec<String>,
}

/// Wraps a [`RemoteLauncher`] with bounded retry and backoff.
#[derive(Clone)]
pub struct RetryingLauncher<L: RemoteLauncher> {
    remote: L,
    config: RetryConfig,
    cancellation: CancellationToken,
}

impl<L: RemoteLauncher> RetryingLauncher<L> {
    /// # Errors
    /// Returns [`LaunchpadError::InvalidConfig`] if `config.max_attempts` is 0.
    pub fn new(remote: L, config: RetryConfig, cancellation: CancellationToken) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            remote,
            config,
            cancellation,
        })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Launch `request`, retrying failed outcomes.
    ///
    /// Returns the first successful outcome, or the last failed one once `max_attempts` calls
    /// have failed. Running out of attempts is not an error.
    ///
    /// # Errors
    /// - [`LaunchpadError::RemoteError`] if the remote launcher raised or panicked instead of
    ///   reporting; it carries the attempt number and the errors of the attempts before it
    /// - [`LaunchpadError::Cancelled`] if cancelled before the first call
    pub async fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome> {
        Ok(self.launch_with_history(request).await?.outcome)
    }

    /// Like [`launch`](Self::launch), also reporting the attempt count and earlier errors.
    ///
    /// If cancellation fires during a backoff wait, the failure that preceded the wait is
    /// returned as the final outcome.
    #[tracing::instrument(skip(self, request), fields(launch_id = %request.id(), symbol = %request.symbol()))]
    pub async fn launch_with_history(&self, request: &LaunchRequest) -> Result<LaunchAttempts> {
        let max_attempts = self.config.max_attempts;
        let mut prior_errors = Vec::new();
        let mut attempt: u32 = 1;

        if self.cancellation.is_cancelled() {
            tracing::info!("Cancelled before first launch attempt");
            return Err(LaunchpadError::Cancelled);
        }

        loop {
            tracing::debug!(attempt, max_attempts, "Submitting launch attempt");
            counter!("launchpad_launch_attempts_total").increment(1);

            let raised = match AssertUnwindSafe(self.remote.launch(request))
                .catch_unwind()
                .await
            {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => Err(anyhow::Error::from(e)),
                Err(panic) => Err(anyhow::anyhow!(
                    "remote launcher panicked: {}",
                    panic_message(panic.as_ref())
                )),
            };
            let outcome = match raised {
                Ok(outcome) => outcome,
                Err(source) => {
                    tracing::error!(
                        attempt,
                        error = %format!("{:#}", source),
                        "Remote launcher raised an error"
                    );
                    return Err(LaunchpadError::RemoteError {
                        attempt,
                        prior_errors,
                        source,
                    });
                }
            };

            if outcome.success() {
                tracing::info!(
                    attempt,
                    token_address = outcome.token_address().unwrap_or_default(),
                    "Launch succeeded"
                );
                return Ok(LaunchAttempts {
                    outcome,
                    attempts: attempt,
                    prior_errors,
                });
            }
            let error = outcome.error_message().unwrap_or_default().to_string();

            if attempt >= max_attempts {
                tracing::warn!(
                    attempt,
                    error = %error,
                    "Launch failed permanently (no attempts remaining)"
                );
                return Ok(LaunchAttempts {
                    outcome,
                    attempts: attempt,
                    prior_errors,
                });
            }

            let backoff = self.config.backoff_for(attempt);
            tracing::warn!(
                attempt,
                error = %error,
                backoff_ms = backoff.as_millis() as u64,
                "Launch attempt failed, retrying after backoff"
            );
            counter!("launchpad_launch_retries_total").increment(1);

            let cancelled = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => true,
                _ = tokio::time::sleep(backoff) => false,
            };
            if cancelled {
                tracing::info!(attempt, "Cancelled during backoff, keeping last failure");
                return Ok(LaunchAttempts {
                    outcome,
                    attempts: attempt,
                    prior_errors,
                });
            }

            prior_errors.push(error);
            attempt += 1;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LaunchRequestInput;
    use crate::launcher::MockRemoteLauncher;
    use tokio::time::Instant;

    fn request(symbol: &str) -> LaunchRequest {
        LaunchRequestInput {
            name: "Alpha Token".to_string(),
            symbol: symbol.to_string(),
            metadata_uri: "https://arweave.net/alpha-metadata".to_string(),
            initial_buy: 0.001,
            priority_fee: 0.0005,
            mint: None,
        }
        .validate()
        .unwrap()
    }

    fn launcher(
        mock: &MockRemoteLauncher,
        max_attempts: u32,
    ) -> RetryingLauncher<MockRemoteLauncher> {
        RetryingLauncher::new(
            mock.clone(),
            RetryConfig {
                max_attempts,
                ..Default::default()
            },
            CancellationToken::new(),
        )
        .unwrap()
    }

    /// Gaps between consecutive recorded calls, in whole milliseconds.
    fn call_gaps_ms(mock: &MockRemoteLauncher) -> Vec<u128> {
        let calls = mock.get_calls();
        calls
            .windows(2)
            .map(|pair| pair[1].at.duration_since(pair[0].at).as_millis())
            .collect()
    }

    // Paused time can round a timer up by a tick.
    fn assert_close_ms(actual: u128, expected: u128) {
        assert!(
            actual >= expected && actual <= expected + 5,
            "expected ~{}ms, got {}ms",
            expected,
            actual
        );
    }

    fn assert_gaps(mock: &MockRemoteLauncher, expected: &[u128]) {
        let gaps = call_gaps_ms(mock);
        assert_eq!(gaps.len(), expected.len(), "gaps: {:?}", gaps);
        for (actual, expected) in gaps.iter().zip(expected) {
            assert_close_ms(*actual, *expected);
        }
    }

    #[test]
    fn test_backoff_grows_linearly_and_respects_cap() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for(2), Duration::from_secs(4));
        assert_eq!(config.backoff_for(3), Duration::from_secs(6));

        let capped = RetryConfig {
            max_backoff_ms: Some(5000),
            ..Default::default()
        };
        assert_eq!(capped.backoff_for(3), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = RetryingLauncher::new(
            MockRemoteLauncher::new(),
            RetryConfig {
                max_attempts: 0,
                ..Default::default()
            },
            CancellationToken::new(),
        );
        assert!(matches!(
            result,
            Err(LaunchpadError::InvalidConfig {
                field: "max_attempts",
                ..
            })
        ));
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_always_failing_exhausts_attempts_with_growing_backoff() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "fail 1", 1);
        mock.add_failures("ALPHA", "fail 2", 1);
        mock.add_failures("ALPHA", "fail 3", 1);
        mock.add_failures("ALPHA", "fail 4", 1);

        let start = Instant::now();
        let result = launcher(&mock, 4)
            .launch_with_history(&request("alpha"))
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 4);
        assert_eq!(result.attempts, 4);
        assert_eq!(result.outcome, LaunchOutcome::failed("fail 4"));
        assert_eq!(result.prior_errors, vec!["fail 1", "fail 2", "fail 3"]);
        assert_gaps(&mock, &[2000, 4000, 6000]);
        // No wait after the final attempt
        assert_close_ms(start.elapsed().as_millis(), 12000);
    }

    #[test_log::test(tokio::test(start_paused = true))]
    async fn test_success_on_later_attempt_stops_retrying() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "blockhash expired", 2);
        mock.add_outcome("ALPHA", LaunchOutcome::launched("Mint111", "sig111"));
        // Never reached
        mock.add_failures("ALPHA", "unused", 1);

        let start = Instant::now();
        let outcome = launcher(&mock, 5).launch(&request("alpha")).await.unwrap();

        assert_eq!(outcome, LaunchOutcome::launched("Mint111", "sig111"));
        assert_eq!(mock.call_count(), 3);
        assert_gaps(&mock, &[2000, 4000]);
        assert_close_ms(start.elapsed().as_millis(), 6000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "rpc unavailable", 2);

        let start = Instant::now();
        let outcome = launcher(&mock, 1).launch(&request("alpha")).await.unwrap();

        assert_eq!(outcome, LaunchOutcome::failed("rpc unavailable"));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_error_is_not_retried() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "first", 1);
        mock.add_response(
            "ALPHA",
            Err(LaunchpadError::Other(anyhow::anyhow!("client exploded"))),
        );

        let result = launcher(&mock, 3).launch(&request("alpha")).await;

        match result {
            Err(LaunchpadError::RemoteError {
                attempt,
                prior_errors,
                source,
            }) => {
                assert_eq!(attempt, 2);
                assert_eq!(prior_errors, vec!["first"]);
                assert!(format!("{:#}", source).contains("client exploded"));
            }
            other => panic!("expected RemoteError, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_after_failures_keeps_history() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "slot skipped", 1);
        mock.add_failures("ALPHA", "node behind", 1);
        mock.add_panic("ALPHA", "keypair file corrupted");

        let result = launcher(&mock, 5).launch(&request("alpha")).await;

        match result {
            Err(LaunchpadError::RemoteError {
                attempt,
                prior_errors,
                source,
            }) => {
                assert_eq!(attempt, 3);
                assert_eq!(prior_errors, vec!["slot skipped", "node behind"]);
                assert!(source.to_string().contains("keypair file corrupted"));
            }
            other => panic!("expected RemoteError, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.in_flight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_attempt() {
        let mock = MockRemoteLauncher::new();
        let token = CancellationToken::new();
        let launcher =
            RetryingLauncher::new(mock.clone(), RetryConfig::default(), token.clone()).unwrap();
        token.cancel();

        let result = launcher.launch(&request("alpha")).await;

        assert!(matches!(result, Err(LaunchpadError::Cancelled)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_returns_last_failure() {
        let mock = MockRemoteLauncher::new();
        mock.add_failures("ALPHA", "slot skipped", 3);
        let token = CancellationToken::new();
        let launcher =
            RetryingLauncher::new(mock.clone(), RetryConfig::default(), token.clone()).unwrap();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                token.cancel();
            })
        };

        let result = launcher.launch_with_history(&request("alpha")).await.unwrap();
        canceller.await.unwrap();

        assert_eq!(result.outcome, LaunchOutcome::failed("slot skipped"));
        assert_eq!(result.attempts, 1);
        assert!(result.prior_errors.is_empty());
        assert_eq!(mock.call_count(), 1);
    }
}

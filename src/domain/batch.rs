//! Batch result types.
//!
//! A batch is an ordered run of launch requests. Each request produces exactly one
//! [`BatchJobResult`], and results keep the order requests were submitted in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::outcome::LaunchOutcome;
use super::request::LaunchRequest;

/// Final result of one job in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchJobResult {
    /// The request this job launched
    pub request: LaunchRequest,
    /// First success, or the last failure once retries were exhausted
    pub outcome: LaunchOutcome,
    /// Number of remote calls that returned (0 if the job never reached the remote side)
    pub attempts: u32,
    /// Errors reported by attempts before the final one, oldest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prior_errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchJobResult {
    pub fn success(&self) -> bool {
        self.outcome.success()
    }
}

/// Success and failure counts for a finished batch.
///
/// Computed on demand by [`summarize`](crate::summary::summarize); never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    /// True when every job launched. An empty batch counts as all succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

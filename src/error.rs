//! Error types for the launch workflow.
//!
//! Expected remote failures are not errors: they travel as
//! [`LaunchOutcome::Failed`](crate::domain::LaunchOutcome::Failed) values. The variants here
//! cover malformed configuration, cancellation, and remote launchers that raise instead of
//! reporting.

use thiserror::Error;

/// Result type alias using the launchpad error type.
pub type Result<T> = std::result::Result<T, LaunchpadError>;

/// Main error type for the launch workflow.
#[derive(Error, Debug)]
pub enum LaunchpadError {
    /// A launch request or runner configuration failed validation
    #[error("Invalid config: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// The remote launcher raised an error (or panicked) instead of reporting an outcome
    #[error("Remote launcher errored on attempt {attempt}: {source:#}")]
    RemoteError {
        attempt: u32,
        /// Errors reported by the failed attempts before this one, oldest first
        prior_errors: Vec<String>,
        #[source]
        source: anyhow::Error,
    },

    /// The run was cancelled before an outcome was produced
    #[error("Launch cancelled")]
    Cancelled,

    /// HTTP client error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error from anyhow
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaunchpadError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LaunchpadError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

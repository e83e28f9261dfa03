//! Outcome of a single remote launch attempt.

use serde::{Deserialize, Serialize};

/// Terminal result of one launch attempt as reported by the remote launcher.
///
/// A reported failure is an ordinary value, not an error: the retry loop inspects it and
/// decides whether to try again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// The token was created
    Launched {
        /// Address of the new token mint
        token_address: String,
        /// Signature of the creation transaction
        transaction_ref: String,
    },
    /// The remote side reported the launch as unsuccessful
    Failed {
        /// Human-readable reason
        error: String,
    },
}

impl LaunchOutcome {
    pub fn launched(token_address: impl Into<String>, transaction_ref: impl Into<String>) -> Self {
        LaunchOutcome::Launched {
            token_address: token_address.into(),
            transaction_ref: transaction_ref.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        LaunchOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }

    pub fn token_address(&self) -> Option<&str> {
        match self {
            LaunchOutcome::Launched { token_address, .. } => Some(token_address),
            LaunchOutcome::Failed { .. } => None,
        }
    }

    pub fn transaction_ref(&self) -> Option<&str> {
        match self {
            LaunchOutcome::Launched {
                transaction_ref, ..
            } => Some(transaction_ref),
            LaunchOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LaunchOutcome::Failed { error } => Some(error),
            LaunchOutcome::Launched { .. } => None,
        }
    }
}

//! Orchestration for launching tokens through an unreliable remote issuance backend.
//!
//! Launch requests are validated once, up front. Each launch is then submitted through a
//! [`RetryingLauncher`] that retries reported failures with a growing backoff, and a
//! [`BatchRunner`] drives a list of launches one at a time with a pause between jobs to stay
//! under upstream rate limits. Per-job results come back in submission order and can be
//! reduced to a [`BatchSummary`] with [`summarize`].
//!
//! The remote backend is abstracted behind [`RemoteLauncher`]; this crate does no signing,
//! key management, or console output of its own.

pub mod domain;
pub mod error;
pub mod launcher;
pub mod retry;
pub mod runner;
pub mod summary;

// Re-export commonly used types
pub use domain::{
    BatchJobResult, BatchSummary, LaunchId, LaunchOutcome, LaunchRequest, LaunchRequestInput,
    MintIdentity,
};
pub use error::{LaunchpadError, Result};
pub use launcher::{HttpLauncherConfig, HttpRemoteLauncher, MockRemoteLauncher, RemoteLauncher};
pub use retry::{LaunchAttempts, RetryConfig, RetryingLauncher};
pub use runner::{BatchRunner, CANCELLED_ERROR, RunnerConfig};
pub use summary::summarize;

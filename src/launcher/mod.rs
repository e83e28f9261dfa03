//! Remote launcher abstraction.
//!
//! This module defines the `RemoteLauncher` trait, the boundary to the external token-issuance
//! backend, so the retry and batch logic can be exercised without touching a real chain.

use async_trait::async_trait;

use crate::domain::{LaunchOutcome, LaunchRequest};
use crate::error::Result;

pub mod http;
pub mod mock;

pub use http::{HttpLauncherConfig, HttpRemoteLauncher};
pub use mock::{MockCall, MockRemoteLauncher};

/// Trait for submitting a single token launch to the remote backend.
///
/// Implementations report the two expected outcome classes through [`LaunchOutcome`]. An
/// `Err` means something outside that channel went wrong (a malformed response, a broken
/// client); callers do not retry it.
///
/// # Example
/// ```ignore
/// let launcher = HttpRemoteLauncher::new(HttpLauncherConfig::new("https://launch.example.com"))?;
/// match launcher.launch(&request).await? {
///     LaunchOutcome::Launched { token_address, .. } => println!("Token: {}", token_address),
///     LaunchOutcome::Failed { error } => println!("Failed: {}", error),
/// }
/// ```
#[async_trait]
pub trait RemoteLauncher: Send + Sync + Clone {
    /// Submit one launch attempt and wait for its outcome.
    ///
    /// The call may take as long as the backend needs; any timeout belongs to the
    /// implementation.
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome>;
}

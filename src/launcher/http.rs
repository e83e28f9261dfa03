//! HTTP implementation of [`RemoteLauncher`] using reqwest.
//!
//! Submits launches as JSON to `{endpoint}/launch`. Transport failures and non-2xx statuses
//! are reported as failed outcomes so the retry loop can try again; a 2xx body that cannot be
//! understood is an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RemoteLauncher;
use crate::domain::{LaunchOutcome, LaunchRequest};
use crate::error::Result;

fn default_timeout_ms() -> u64 {
    60_000
}

/// Connection settings for [`HttpRemoteLauncher`].
#[derive(Clone, Deserialize)]
pub struct HttpLauncherConfig {
    /// Base URL of the launch backend (e.g., <https://launch.example.com>)
    pub endpoint: String,

    /// API key sent as a bearer token; empty means no Authorization header
    #[serde(default)]
    pub api_key: String,

    /// Timeout for each launch call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl HttpLauncherConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Serialize)]
struct LaunchPayload<'a> {
    name: &'a str,
    symbol: &'a str,
    metadata_uri: &'a str,
    initial_buy: f64,
    priority_fee: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    mint: Option<&'a str>,
}

impl<'a> From<&'a LaunchRequest> for LaunchPayload<'a> {
    fn from(request: &'a LaunchRequest) -> Self {
        LaunchPayload {
            name: request.name(),
            symbol: request.symbol(),
            metadata_uri: request.metadata_uri(),
            initial_buy: request.initial_buy(),
            priority_fee: request.priority_fee(),
            mint: request.mint().map(|mint| mint.as_str()),
        }
    }
}

#[derive(Deserialize)]
struct LaunchResponse {
    success: bool,
    #[serde(default)]
    token_address: Option<String>,
    #[serde(default)]
    signature: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a backend response to a launch outcome.
fn parse_response(status: u16, body: &str) -> Result<LaunchOutcome> {
    if !(200..300).contains(&status) {
        return Ok(LaunchOutcome::failed(format!("HTTP {}: {}", status, body)));
    }

    let response: LaunchResponse = serde_json::from_str(body)?;
    if !response.success {
        return Ok(LaunchOutcome::failed(response.error.unwrap_or_else(|| {
            "remote launch failed without an error message".to_string()
        })));
    }

    match (response.token_address, response.signature) {
        (Some(token_address), Some(signature)) => {
            Ok(LaunchOutcome::launched(token_address, signature))
        }
        _ => Err(anyhow::anyhow!(
            "malformed launch response: success reported without token address and signature"
        )
        .into()),
    }
}

/// Production launcher that talks to the launch backend over HTTP.
#[derive(Clone)]
pub struct HttpRemoteLauncher {
    client: reqwest::Client,
    config: HttpLauncherConfig,
}

impl HttpRemoteLauncher {
    pub fn new(config: HttpLauncherConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RemoteLauncher for HttpRemoteLauncher {
    #[tracing::instrument(skip(self, request), fields(launch_id = %request.id(), symbol = %request.symbol()))]
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome> {
        let url = format!("{}/launch", self.config.endpoint.trim_end_matches('/'));

        tracing::debug!(
            url = %url,
            timeout_ms = self.config.timeout_ms,
            custom_mint = request.mint().is_some(),
            "Submitting launch"
        );

        let mut req = self
            .client
            .post(&url)
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .json(&LaunchPayload::from(request));

        // Only add Authorization header if api_key is not empty
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                tracing::error!(url = %url, error = %e, "Invalid launch request");
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Launch request failed in transport");
                return Ok(LaunchOutcome::failed(format!("transport error: {}", e)));
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(status, error = %e, "Failed to read launch response body");
                return Ok(LaunchOutcome::failed(format!(
                    "failed to read response body: {}",
                    e
                )));
            }
        };

        tracing::info!(status, response_len = body.len(), "Launch call completed");

        parse_response(status, &body)
    }
}

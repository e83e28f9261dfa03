//! Scriptable [`RemoteLauncher`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::RemoteLauncher;
use crate::domain::{LaunchId, LaunchOutcome, LaunchRequest};
use crate::error::{LaunchpadError, Result};

/// Mock remote launcher for testing.
///
/// Responses are queued per ticker symbol and handed out in FIFO order. Every call is
/// recorded together with the (tokio) instant it was made, so tests running on paused time
/// can check the exact spacing between attempts.
///
/// # Example
/// ```ignore
/// let mock = MockRemoteLauncher::new();
/// mock.add_outcome("ALPHA", LaunchOutcome::failed("blockhash expired"));
/// mock.add_outcome("ALPHA", LaunchOutcome::launched("Mint111", "sig111"));
/// ```
#[derive(Clone)]
pub struct MockRemoteLauncher {
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    in_flight: Arc<AtomicUsize>,
}

enum MockResponse {
    /// Immediate response
    Immediate(Result<LaunchOutcome>),
    /// Response that waits for a trigger signal before completing
    Triggered {
        response: Result<LaunchOutcome>,
        trigger: oneshot::Receiver<()>,
    },
    /// Panic inside the launch call
    Panic(String),
}

/// Record of a call made to the mock launcher.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub launch_id: LaunchId,
    pub name: String,
    pub symbol: String,
    pub at: Instant,
}

impl MockRemoteLauncher {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn push(&self, symbol: &str, response: MockResponse) {
        self.responses
            .lock()
            .entry(symbol.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue an outcome for the next launch of `symbol`.
    pub fn add_outcome(&self, symbol: &str, outcome: LaunchOutcome) {
        self.push(symbol, MockResponse::Immediate(Ok(outcome)));
    }

    /// Queue a raw response, including errors raised outside the outcome channel.
    pub fn add_response(&self, symbol: &str, response: Result<LaunchOutcome>) {
        self.push(symbol, MockResponse::Immediate(response));
    }

    /// Queue the same failed outcome `times` times.
    pub fn add_failures(&self, symbol: &str, error: &str, times: usize) {
        for _ in 0..times {
            self.add_outcome(symbol, LaunchOutcome::failed(error));
        }
    }

    /// Queue a response that only completes once the returned sender fires (or is dropped).
    pub fn add_response_with_trigger(
        &self,
        symbol: &str,
        response: Result<LaunchOutcome>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            symbol,
            MockResponse::Triggered {
                response,
                trigger: rx,
            },
        );
        tx
    }

    /// Make the next launch of `symbol` panic.
    pub fn add_panic(&self, symbol: &str, message: &str) {
        self.push(symbol, MockResponse::Panic(message.to_string()));
    }

    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls made for one symbol.
    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.symbol == symbol)
            .count()
    }

    /// Number of launch calls currently executing.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockRemoteLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteLauncher for MockRemoteLauncher {
    async fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard {
            in_flight: self.in_flight.clone(),
        };

        self.calls.lock().push(MockCall {
            launch_id: request.id(),
            name: request.name().to_string(),
            symbol: request.symbol().to_string(),
            at: Instant::now(),
        });

        let next = self
            .responses
            .lock()
            .get_mut(request.symbol())
            .and_then(|queue| queue.pop_front());

        match next {
            Some(MockResponse::Immediate(response)) => response,
            Some(MockResponse::Triggered { response, trigger }) => {
                // Proceed whether the trigger fired or was dropped
                let _ = trigger.await;
                response
            }
            Some(MockResponse::Panic(message)) => panic!("{}", message),
            None => Err(LaunchpadError::Other(anyhow::anyhow!(
                "No mock response configured for {}",
                request.symbol()
            ))),
        }
    }
}

/// Decrements the in-flight counter when dropped, even if the call is cancelled or panics.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

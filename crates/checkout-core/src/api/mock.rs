//! Mock Commerce API
//!
//! For tests and dry runs. Replays a queue of scripted responses and
//! records every call it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CommerceApi, Endpoint, RawResponse};
use crate::error::TransportError;

/// A request the mock received
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub endpoint: Endpoint,
    pub body: Option<serde_json::Value>,
}

/// Scripted commerce API
#[derive(Default)]
pub struct MockCommerceApi {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCommerceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with responses replayed in order
    pub fn with_responses(responses: impl IntoIterator<Item = RawResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn push_response(&self, response: RawResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    /// Queue a transport failure (timeout, refused connection, ...)
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Err(TransportError(message.into())));
    }

    /// Everything received so far
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Calls that hit `endpoint`
    pub async fn calls_to(&self, matches: impl Fn(&Endpoint) -> bool) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| matches(&c.endpoint))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommerceApi for MockCommerceApi {
    async fn call(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse, TransportError> {
        self.calls.lock().await.push(RecordedCall {
            endpoint: endpoint.clone(),
            body: body.cloned(),
        });

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(TransportError(format!("no scripted response for {}", endpoint.path()))))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

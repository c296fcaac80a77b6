//! Receiver State

use std::{collections::VecDeque, sync::Arc};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

/// One request the receiver logged
#[derive(Clone, Debug)]
pub struct ReceivedWebhook {
    pub received_at: DateTime<Utc>,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub raw_body: String,

    /// `None` when the body was not JSON
    pub parsed_body: Option<Value>,

    /// `None` when no secret is configured or no signature was sent
    pub signature_valid: Option<bool>,
}

/// Most recent webhooks kept in memory; older ones are dropped
pub const MAX_RETAINED: usize = 100;

/// Shared receiver state
#[derive(Clone, Default)]
pub struct ReceiverState {
    /// Secret for `X-CoinSub-Signature` checks (optional)
    pub secret: Option<Arc<str>>,

    /// Last `MAX_RETAINED` webhooks, oldest first
    pub received: Arc<Mutex<VecDeque<ReceivedWebhook>>>,
}

impl ReceiverState {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.map(Arc::from),
            received: Arc::default(),
        }
    }

    /// Keep `entry`, evicting the oldest once the log is full
    pub async fn record(&self, entry: ReceivedWebhook) {
        let mut received = self.received.lock().await;
        if received.len() == MAX_RETAINED {
            received.pop_front();
        }
        received.push_back(entry);
    }
}

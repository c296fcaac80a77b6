//! Commerce API Client
//!
//! The transport seam for the checkout flow. Components build typed request
//! bodies and interpret status codes and response fields themselves; the
//! client only moves JSON over HTTP.

mod http;
mod mock;

pub use http::HttpCommerceClient;
pub use mock::{MockCommerceApi, RecordedCall};

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::{CheckoutError, Phase, Result, TransportError};

/// Commerce API endpoints the flow consumes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// `POST /commerce/products`
    CreateProduct,

    /// `POST /commerce/orders`
    CreateOrder,

    /// `POST /purchase/session/start`
    StartSession,

    /// `PUT /commerce/orders/{order_id}/checkout`
    LinkCheckout { order_id: String },

    /// `GET /purchase/status/{session_id}`
    SessionStatus { session_id: String },
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::CreateProduct | Endpoint::CreateOrder | Endpoint::StartSession => Method::POST,
            Endpoint::LinkCheckout { .. } => Method::PUT,
            Endpoint::SessionStatus { .. } => Method::GET,
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        match self {
            Endpoint::CreateProduct => "/commerce/products".into(),
            Endpoint::CreateOrder => "/commerce/orders".into(),
            Endpoint::StartSession => "/purchase/session/start".into(),
            Endpoint::LinkCheckout { order_id } => format!("/commerce/orders/{order_id}/checkout"),
            Endpoint::SessionStatus { session_id } => format!("/purchase/status/{session_id}"),
        }
    }
}

/// Status and raw body of an API response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Build a response from a JSON value (handy for mocks)
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Fail with `UnexpectedStatus` unless the status is in `accepted`
    pub fn ensure_status(self, accepted: &[u16], phase: &Phase) -> Result<Self> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(CheckoutError::UnexpectedStatus {
                phase: phase.clone(),
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Parse the body into `T`
    pub fn parse<T: DeserializeOwned>(&self, phase: &Phase) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| CheckoutError::Decode {
            phase: phase.clone(),
            source,
        })
    }

    pub(crate) fn missing(&self, phase: &Phase, field: &'static str) -> CheckoutError {
        CheckoutError::MissingField {
            phase: phase.clone(),
            field,
            body: self.body.clone(),
        }
    }
}

/// Commerce API transport (Strategy pattern)
///
/// `HttpCommerceClient` talks to the real API; `MockCommerceApi` replays
/// scripted responses in tests.
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Send one request and return whatever came back
    async fn call(
        &self,
        endpoint: &Endpoint,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<RawResponse, TransportError>;

    /// Client name for logs
    fn name(&self) -> &str;
}

/// Encode `body`, send it, and tag transport failures with `phase`
pub(crate) async fn dispatch<B: serde::Serialize + Sync>(
    api: &dyn CommerceApi,
    endpoint: &Endpoint,
    body: Option<&B>,
    phase: &Phase,
) -> Result<RawResponse> {
    let payload = body.map(serde_json::to_value).transpose()?;

    tracing::debug!(
        client = api.name(),
        method = %endpoint.method(),
        path = %endpoint.path(),
        body = ?payload,
        "Sending commerce request"
    );

    let response = api
        .call(endpoint, payload.as_ref())
        .await
        .map_err(|source| CheckoutError::Transport {
            phase: phase.clone(),
            source,
        })?;

    tracing::debug!(
        status = response.status,
        body = %response.body,
        "Commerce response received"
    );

    Ok(response)
}

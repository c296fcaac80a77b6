//! Checkout Error Types

use std::fmt;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// The step of the checkout run an error came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Connection check before the flow starts
    Preflight,

    /// Product creation, 1-based position in the submitted list
    Product { index: usize, name: String },

    /// Order creation
    Order,

    /// Purchase session creation
    Session,

    /// Order → session checkout link
    Link,

    /// Purchase session status lookup
    Status,

    /// Webhook probe
    Webhook,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Preflight => write!(f, "connection check"),
            Phase::Product { index, name } => write!(f, "product {index} ({name})"),
            Phase::Order => write!(f, "order creation"),
            Phase::Session => write!(f, "purchase session creation"),
            Phase::Link => write!(f, "checkout link"),
            Phase::Status => write!(f, "session status"),
            Phase::Webhook => write!(f, "webhook probe"),
        }
    }
}

/// Transport-level failure (connection refused, timeout, TLS, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self(format!("timed out: {err}"))
        } else {
            Self(err.to_string())
        }
    }
}

/// Checkout-related errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    /// Network or timeout failure
    #[error("{phase} failed: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: TransportError,
    },

    /// Status code outside the accepted set for the call
    #[error("{phase} failed with status {status}: {body}")]
    UnexpectedStatus {
        phase: Phase,
        status: u16,
        body: String,
    },

    /// Expected response field absent
    #[error("{phase} response is missing `{field}`: {body}")]
    MissingField {
        phase: Phase,
        field: &'static str,
        body: String,
    },

    /// Response body is not the JSON we expected
    #[error("{phase} returned an unreadable body: {source}")]
    Decode {
        phase: Phase,
        #[source]
        source: serde_json::Error,
    },

    /// Request payload could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Rejected locally before anything was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// The run phase that failed, if the error came from a call
    pub fn phase(&self) -> Option<&Phase> {
        match self {
            CheckoutError::Transport { phase, .. }
            | CheckoutError::UnexpectedStatus { phase, .. }
            | CheckoutError::MissingField { phase, .. }
            | CheckoutError::Decode { phase, .. } => Some(phase),
            _ => None,
        }
    }

    /// Raw response body kept for diagnosis
    pub fn response_body(&self) -> Option<&str> {
        match self {
            CheckoutError::UnexpectedStatus { body, .. }
            | CheckoutError::MissingField { body, .. } => Some(body),
            _ => None,
        }
    }
}

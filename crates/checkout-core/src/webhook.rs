//! Webhook Probe
//!
//! Posts a synthetic payment-completion event to a webhook receiver and
//! reports whether it answered 200. Unrelated to anything else the run
//! created: the payload uses pre-baked example identifiers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::ProbeConfig;
use crate::error::{CheckoutError, Phase, Result};
use crate::model::ProductLine;

/// Header carrying the hex HMAC-SHA256 of the raw body
pub const SIGNATURE_HEADER: &str = "x-coinsub-signature";

pub const PROBE_USER_AGENT: &str = "CoinSub-Webhook-Test/1.0";

type HmacSha256 = Hmac<Sha256>;

/// Payment webhook as the receiver expects it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentWebhook {
    #[serde(rename = "type")]
    pub event_type: String,
    pub merchant_id: String,
    pub origin_id: String,
    pub origin: String,
    pub name: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub metadata: WebhookMetadata,
    pub payment_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub status: String,
    pub transaction_details: TransactionDetails,
    pub user: WebhookUser,
    pub payment_id: String,
    pub agreement_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookMetadata {
    pub currency: String,
    pub individual_products: Vec<String>,
    pub product_count: usize,
    pub products: Vec<ProductLine>,
    pub source: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub total_items: usize,
    pub woocommerce_order_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub transaction_id: u64,
    pub transaction_hash: String,
    pub chain_id: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subscriber_id: String,
}

/// Hex HMAC-SHA256 of `body` under `secret`
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CheckoutError::Config(format!("webhook secret: {e}")))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature against `body`
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// What the receiver said
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: u16,
    pub body: String,
}

impl ProbeOutcome {
    pub fn accepted(&self) -> bool {
        self.status == 200
    }
}

/// Webhook probe
pub struct WebhookProbe {
    http: reqwest::Client,
    url: String,
    secret: Option<String>,
    reach_timeout: std::time::Duration,
}

impl WebhookProbe {
    pub fn new(url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            secret: None,
            reach_timeout: crate::config::DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let mut probe = Self::new(config.webhook_url.clone(), config.webhook_timeout)?;
        probe.secret = config.webhook_secret.clone();
        probe.reach_timeout = config.request_timeout;
        Ok(probe)
    }

    /// Sign posted bodies with `secret`
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `payload` and report the receiver's answer
    pub async fn send(&self, payload: &PaymentWebhook) -> Result<ProbeOutcome> {
        let phase = Phase::Webhook;
        let body = serde_json::to_vec(payload)?;

        tracing::info!(
            url = %self.url,
            event_type = %payload.event_type,
            status = %payload.status,
            amount = %payload.amount,
            currency = %payload.currency,
            origin_id = %payload.origin_id,
            order_ref = %payload.metadata.woocommerce_order_id,
            signed = self.secret.is_some(),
            "Posting webhook"
        );

        let mut request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(PROBE_USER_AGENT));

        if let Some(secret) = &self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| CheckoutError::Transport { phase: phase.clone(), source: e.into() })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Transport { phase, source: e.into() })?;

        let outcome = ProbeOutcome { status, body };
        if outcome.accepted() {
            tracing::info!(status, "Webhook accepted");
        } else {
            tracing::warn!(status, body = %outcome.body, "Webhook rejected");
        }
        Ok(outcome)
    }

    /// GET the receiver URL; true when it answers 200
    pub async fn reachable(&self) -> bool {
        match self.http.get(&self.url).timeout(self.reach_timeout).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::info!(url = %self.url, status, "Webhook endpoint answered GET");
                status == 200
            }
            Err(e) => {
                tracing::warn!(url = %self.url, "Webhook endpoint not reachable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"type":"payment"}"#;
        let signature = sign_payload("whsec_test", body).unwrap();

        assert_eq!(signature.len(), 64);
        assert!(verify_signature("whsec_test", body, &signature));
        assert!(!verify_signature("other_secret", body, &signature));
        assert!(!verify_signature("whsec_test", b"{}", &signature));
        assert!(!verify_signature("whsec_test", body, "not-hex"));
    }

    #[test]
    fn test_known_signature() {
        // RFC 4231 test case 2
        let signature = sign_payload("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = fixtures::sample_payment_webhook();
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["type"], "payment");
        assert_eq!(value["status"], "completed");
        assert_eq!(value["amount"], serde_json::json!(0.03));
        assert_eq!(value["metadata"]["product_count"], 2);
        assert_eq!(value["metadata"]["products"][1]["price"], serde_json::json!(0.02));
        assert_eq!(value["transaction_details"]["chain_id"], 80002);
        assert!(value["payment_date"].as_str().unwrap().starts_with("2025-10-03T15:33:59"));
    }

    #[test]
    fn test_outcome_accepts_only_200() {
        assert!(ProbeOutcome { status: 200, body: String::new() }.accepted());
        assert!(!ProbeOutcome { status: 201, body: String::new() }.accepted());
        assert!(!ProbeOutcome { status: 404, body: String::new() }.accepted());
    }

    #[test]
    fn test_probe_from_config() {
        let mut config = ProbeConfig::new(
            "https://api.example.com/v1",
            "merchant-1",
            "key-1",
            "https://hooks.example.com/abc",
        );
        config.webhook_secret = Some("s3cret".into());

        let probe = WebhookProbe::from_config(&config).unwrap();
        assert_eq!(probe.url(), "https://hooks.example.com/abc");
        assert_eq!(probe.secret.as_deref(), Some("s3cret"));
    }
}

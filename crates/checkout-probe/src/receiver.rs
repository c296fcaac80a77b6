//! Webhook Receiver
//!
//! Logs every request it gets and always answers 200, so the probe (or the
//! real commerce API) has somewhere local to send events.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use checkout_core::webhook::{SIGNATURE_HEADER, verify_signature};

use crate::state::{ReceivedWebhook, ReceiverState};

pub fn router(state: ReceiverState) -> Router {
    Router::new()
        .route("/", get(log_webhook).post(log_webhook))
        .route("/webhook", get(log_webhook).post(log_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log the request and acknowledge it
pub async fn log_webhook(
    State(state): State<ReceiverState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let raw_body = String::from_utf8_lossy(&body).into_owned();
    let parsed_body = serde_json::from_slice::<Value>(&body).ok();

    let signature_valid = match (&state.secret, headers.get(SIGNATURE_HEADER)) {
        (Some(secret), Some(signature)) => Some(
            signature
                .to_str()
                .is_ok_and(|sig| verify_signature(secret, &body, sig)),
        ),
        _ => None,
    };

    let entry = ReceivedWebhook {
        received_at: chrono::Utc::now(),
        method: method.to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect(),
        raw_body,
        parsed_body,
        signature_valid,
    };

    tracing::info!(
        method = %entry.method,
        event_type = ?entry.parsed_body.as_ref().and_then(|b| b.get("type")),
        status = ?entry.parsed_body.as_ref().and_then(|b| b.get("status")),
        origin_id = ?entry.parsed_body.as_ref().and_then(|b| b.get("origin_id")),
        bytes = body.len(),
        "Webhook received"
    );
    tracing::debug!(received_at = %entry.received_at, headers = ?entry.headers, body = %entry.raw_body, "Webhook detail");

    match entry.signature_valid {
        Some(true) => tracing::info!("✓ Webhook signature valid"),
        // logged only; the receiver is a debugging aid and accepts regardless
        Some(false) => tracing::warn!("✗ Webhook signature invalid"),
        None if state.secret.is_some() => tracing::warn!("Webhook arrived without a signature"),
        None => {}
    }

    state.record(entry).await;

    (
        StatusCode::OK,
        Json(json!({"status": "success", "message": "Webhook logged"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use checkout_core::{WebhookProbe, fixtures};

    use crate::state::MAX_RETAINED;

    async fn spawn(state: ReceiverState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/webhook")
    }

    #[tokio::test]
    async fn test_probe_payload_is_logged() {
        let state = ReceiverState::new(None);
        let url = spawn(state.clone()).await;

        let probe = WebhookProbe::new(url, Duration::from_secs(5)).unwrap();
        let outcome = probe.send(&fixtures::sample_payment_webhook()).await.unwrap();

        assert!(outcome.accepted());
        let reply: Value = serde_json::from_str(&outcome.body).unwrap();
        assert_eq!(reply["message"], "Webhook logged");

        let received = state.received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].method, "POST");
        let body = received[0].parsed_body.as_ref().unwrap();
        assert_eq!(body["type"], "payment");
        assert_eq!(body["metadata"]["woocommerce_order_id"], "c53e29df-6a01-4fd4-a697-98c398c143f9");
        assert!(received[0]
            .headers
            .iter()
            .any(|(k, v)| k == "user-agent" && v == "CoinSub-Webhook-Test/1.0"));
        assert!(received[0].signature_valid.is_none());
    }

    #[tokio::test]
    async fn test_signed_payload_verified() {
        let state = ReceiverState::new(Some("whsec_local".into()));
        let url = spawn(state.clone()).await;

        let good = WebhookProbe::new(url.clone(), Duration::from_secs(5))
            .unwrap()
            .with_secret("whsec_local");
        let bad = WebhookProbe::new(url, Duration::from_secs(5))
            .unwrap()
            .with_secret("wrong");

        assert!(good.send(&fixtures::sample_payment_webhook()).await.unwrap().accepted());
        assert!(bad.send(&fixtures::sample_payment_webhook()).await.unwrap().accepted());

        let received = state.received.lock().await;
        assert_eq!(received[0].signature_valid, Some(true));
        assert_eq!(received[1].signature_valid, Some(false));
    }

    #[tokio::test]
    async fn test_get_reachability() {
        let state = ReceiverState::new(None);
        let url = spawn(state.clone()).await;

        let probe = WebhookProbe::new(url, Duration::from_secs(5)).unwrap();
        assert!(probe.reachable().await);
        assert_eq!(state.received.lock().await[0].method, "GET");
    }

    #[tokio::test]
    async fn test_unreachable_receiver() {
        // nothing listens on port 9 locally
        let probe = WebhookProbe::new("http://127.0.0.1:9/webhook", Duration::from_secs(2)).unwrap();
        assert!(!probe.reachable().await);
        let err = probe.send(&fixtures::sample_payment_webhook()).await.unwrap_err();
        assert_eq!(err.phase(), Some(&checkout_core::Phase::Webhook));
    }

    #[tokio::test]
    async fn test_log_keeps_only_recent_webhooks() {
        let state = ReceiverState::new(None);
        let padding = "x".repeat(10_000);

        for i in 0..MAX_RETAINED + 400 {
            let body = Bytes::from(json!({"seq": i, "padding": padding}).to_string());
            let (status, _) =
                log_webhook(State(state.clone()), Method::POST, HeaderMap::new(), body).await;
            assert_eq!(status, StatusCode::OK);
        }

        let received = state.received.lock().await;
        assert_eq!(received.len(), MAX_RETAINED);
        assert_eq!(received[0].parsed_body.as_ref().unwrap()["seq"], 400);
        assert_eq!(
            received[MAX_RETAINED - 1].parsed_body.as_ref().unwrap()["seq"],
            MAX_RETAINED + 399
        );
    }
}

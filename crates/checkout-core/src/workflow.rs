//! Checkout Workflow
//!
//! Runs the chain strictly in order, each phase feeding the next:
//!
//! ```text
//! products ──▶ order ──▶ session ──▶ link ──▶ (verify, multi-item only)
//! ```
//!
//! Any phase failure ends the run; verification never does.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{CommerceApi, Endpoint, dispatch};
use crate::config::ProbeConfig;
use crate::error::{CheckoutError, Phase, Result};
use crate::fixtures;
use crate::model::{CreatedOrder, CreatedProduct, LinkedSession, Metadata, ProductDraft};
use crate::order::OrderBuilder;
use crate::product::{PRODUCT_OK, ProductCreator};
use crate::session::{SessionLinker, SessionOptions};
use crate::verify::{VerificationReport, verify_session};

/// Which flow to run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    SingleItem,
    MultiItem,
}

/// Everything a successful run created
#[derive(Clone, Debug, Serialize)]
pub struct CheckoutReport {
    pub run_id: Uuid,
    pub flow: FlowKind,
    pub products: Vec<CreatedProduct>,
    pub order: CreatedOrder,
    pub session: LinkedSession,

    /// Present for the multi-item flow
    pub verification: Option<VerificationReport>,
}

impl CheckoutReport {
    /// Verification outcome; the single-item flow has nothing to verify
    pub fn verified(&self) -> bool {
        self.verification.as_ref().is_none_or(VerificationReport::passed)
    }

    /// Log the summary of created ids and the checkout URL
    pub fn log_summary(&self) {
        tracing::info!(run_id = %self.run_id, flow = ?self.flow, "Checkout run complete");
        for (i, product) in self.products.iter().enumerate() {
            tracing::info!("  {}. {} - ${} (id {})", i + 1, product.name, product.price, product.id);
        }
        tracing::info!("  Order ID:            {}", self.order.id);
        tracing::info!("  Purchase session ID: {}", self.session.purchase_session_id);
        tracing::info!("  Combined name:       {}", self.session.combined_name);
        tracing::info!("  Total amount:        ${}", self.session.total_amount);
        match &self.session.checkout_url {
            Some(url) => tracing::info!("  Checkout URL:        {}", url),
            None => tracing::warn!("  Checkout URL:        (none returned)"),
        }
    }
}

/// Checkout workflow runner
pub struct CheckoutWorkflow {
    api: Arc<dyn CommerceApi>,
    products: ProductCreator,
    orders: OrderBuilder,
    sessions: SessionLinker,
}

impl CheckoutWorkflow {
    pub fn new(api: Arc<dyn CommerceApi>, options: SessionOptions, currency: &str) -> Self {
        Self {
            products: ProductCreator::new(api.clone()),
            orders: OrderBuilder::new(api.clone(), currency),
            sessions: SessionLinker::new(api.clone(), options),
            api,
        }
    }

    pub fn from_config(api: Arc<dyn CommerceApi>, config: &ProbeConfig) -> Self {
        let mut options = SessionOptions::new(config.success_url.clone(), config.cancel_url.clone());
        options.name_prefix = config.session_name_prefix.clone();
        Self::new(api, options, fixtures::CURRENCY)
    }

    pub fn sessions(&self) -> &SessionLinker {
        &self.sessions
    }

    /// Confirm credentials by creating a throwaway product
    pub async fn check_connection(&self) -> Result<()> {
        let phase = Phase::Preflight;
        let draft = fixtures::connection_test_product();

        tracing::info!("Testing API connection");
        dispatch(self.api.as_ref(), &Endpoint::CreateProduct, Some(&draft), &phase)
            .await?
            .ensure_status(&PRODUCT_OK, &phase)?;
        tracing::info!("✓ API connection successful");
        Ok(())
    }

    /// One product, one order, one linked session
    pub async fn run_single(&self, draft: ProductDraft) -> Result<CheckoutReport> {
        let metadata = fixtures::order_metadata("67890", None);
        self.run(FlowKind::SingleItem, std::slice::from_ref(&draft), metadata).await
    }

    /// Several products combined into one order and session, then verified
    pub async fn run_multi(&self, drafts: &[ProductDraft]) -> Result<CheckoutReport> {
        if drafts.len() < 2 {
            return Err(CheckoutError::InvalidInput(format!(
                "multi-item flow needs at least two products, got {}",
                drafts.len()
            )));
        }
        let metadata = fixtures::order_metadata("MULTI-001", Some("multi_product_test"));
        self.run(FlowKind::MultiItem, drafts, metadata).await
    }

    async fn run(&self, flow: FlowKind, drafts: &[ProductDraft], mut metadata: Metadata) -> Result<CheckoutReport> {
        let run_id = Uuid::new_v4();
        metadata.insert("probe_run_id".into(), serde_json::json!(run_id.to_string()));

        let span = tracing::info_span!("checkout", %run_id, flow = ?flow);
        async move {
            let products = self.products.create_all(drafts).await?;
            let order = self.orders.submit(&products, metadata).await?;
            let session = self.sessions.start_and_link(&order, &products).await?;

            let verification = (flow == FlowKind::MultiItem).then(|| {
                let report = verify_session(&session, &products);
                report.log();
                report
            });

            Ok(CheckoutReport {
                run_id,
                flow,
                products,
                order,
                session,
                verification,
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockCommerceApi, RawResponse};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn workflow(mock: Arc<MockCommerceApi>) -> CheckoutWorkflow {
        CheckoutWorkflow::new(
            mock,
            SessionOptions::new("https://hooks.example.com/success", "https://hooks.example.com/cancel"),
            "USD",
        )
    }

    fn happy_multi_responses() -> Vec<RawResponse> {
        vec![
            RawResponse::json(201, &json!({"id": "p-1"})),
            RawResponse::json(201, &json!({"id": "p-2"})),
            RawResponse::json(201, &json!({"id": "ord-1"})),
            RawResponse::json(200, &json!({"data": {"purchase_session_id": "sess_s-1", "url": "https://pay.example.com/s-1"}})),
            RawResponse::json(200, &json!({"status": "ok"})),
        ]
    }

    #[tokio::test]
    async fn test_multi_item_end_to_end() {
        let mock = Arc::new(MockCommerceApi::with_responses(happy_multi_responses()));

        let report = workflow(mock.clone()).run_multi(&fixtures::multi_products()).await.unwrap();

        assert_eq!(report.flow, FlowKind::MultiItem);
        assert_eq!(report.order.total, dec!(0.03));
        assert_eq!(report.session.combined_name, "Premium T-Shirt + Wireless Headphones");
        assert_eq!(report.session.purchase_session_id, "s-1");
        assert_eq!(report.session.checkout_url.as_deref(), Some("https://pay.example.com/s-1"));
        assert!(report.verification.as_ref().unwrap().passed());
        assert!(report.verified());

        let calls = mock.calls().await;
        let endpoints: Vec<_> = calls.iter().map(|c| c.endpoint.clone()).collect();
        assert_eq!(
            endpoints,
            [
                Endpoint::CreateProduct,
                Endpoint::CreateProduct,
                Endpoint::CreateOrder,
                Endpoint::StartSession,
                Endpoint::LinkCheckout { order_id: "ord-1".into() },
            ]
        );

        let order_body = calls[2].body.as_ref().unwrap();
        assert_eq!(order_body["total"], json!(0.03));
        assert_eq!(order_body["metadata"]["order_type"], "multi_product_test");
        assert_eq!(order_body["metadata"]["probe_run_id"], report.run_id.to_string());

        let session_body = calls[3].body.as_ref().unwrap();
        assert_eq!(session_body["name"], "Premium T-Shirt + Wireless Headphones");
        assert_eq!(session_body["metadata"]["woocommerce_order_id"], "ord-1");
        assert_eq!(calls[4].body, Some(json!({"purchase_session_id": "s-1"})));
    }

    #[tokio::test]
    async fn test_single_item_has_no_verification() {
        let mock = Arc::new(MockCommerceApi::with_responses([
            RawResponse::json(201, &json!({"id": "p-1"})),
            RawResponse::json(200, &json!({"id": "ord-1"})),
            RawResponse::json(200, &json!({"data": {"purchase_session_id": "abc123", "url": "https://pay.example.com/x"}})),
            RawResponse::new(200, ""),
        ]));

        let draft = fixtures::single_product().remove(0);
        let report = workflow(mock).run_single(draft).await.unwrap();

        assert_eq!(report.flow, FlowKind::SingleItem);
        assert_eq!(report.session.combined_name, "Test WooCommerce Product");
        assert_eq!(report.session.purchase_session_id, "abc123");
        assert_eq!(report.order.total, dec!(25.99));
        assert!(report.verification.is_none());
        assert!(report.verified());
    }

    #[tokio::test]
    async fn test_session_failure_short_circuits() {
        let mut responses = happy_multi_responses();
        responses[3] = RawResponse::new(503, "maintenance");
        let mock = Arc::new(MockCommerceApi::with_responses(responses));

        let err = workflow(mock.clone()).run_multi(&fixtures::multi_products()).await.unwrap_err();

        assert_eq!(err.phase(), Some(&Phase::Session));
        let links = mock.calls_to(|e| matches!(e, Endpoint::LinkCheckout { .. })).await;
        assert!(links.is_empty());
        assert_eq!(mock.calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_product_failure_stops_before_order() {
        let mock = Arc::new(MockCommerceApi::with_responses([
            RawResponse::json(201, &json!({"id": "p-1"})),
            RawResponse::new(401, r#"{"message":"invalid api key"}"#),
        ]));

        let err = workflow(mock.clone()).run_multi(&fixtures::multi_products()).await.unwrap_err();

        assert!(matches!(err.phase(), Some(Phase::Product { index: 2, .. })));
        let orders = mock.calls_to(|e| *e == Endpoint::CreateOrder).await;
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_multi_needs_two_products() {
        let mock = Arc::new(MockCommerceApi::new());
        let err = workflow(mock.clone())
            .run_multi(&fixtures::single_product())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidInput(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_connection_check() {
        let mock = Arc::new(MockCommerceApi::with_responses([
            RawResponse::json(201, &json!({"id": "conn"})),
            RawResponse::new(403, "forbidden"),
        ]));
        let flow = workflow(mock.clone());

        assert!(flow.check_connection().await.is_ok());
        let err = flow.check_connection().await.unwrap_err();
        assert_eq!(err.phase(), Some(&Phase::Preflight));

        let first = &mock.calls().await[0];
        assert_eq!(first.body.as_ref().unwrap()["name"], "API Connection Test");
        assert_eq!(first.body.as_ref().unwrap()["price"], json!(1.0));
    }
}

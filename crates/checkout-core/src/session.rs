//! Purchase Sessions
//!
//! Two phases, both required:
//!
//! ```text
//! POST /purchase/session/start          → {data: {purchase_session_id, url}}
//! PUT  /commerce/orders/{id}/checkout   ← {purchase_session_id: <canonical id>}
//! ```
//!
//! Unlike products and orders, the session endpoint nests its result under
//! `data`. That shape belongs to the API and is parsed as-is.

use std::sync::Arc;

use serde_json::Value;

use crate::api::{CommerceApi, Endpoint, dispatch};
use crate::error::{Phase, Result};
use crate::model::{
    CheckoutLink, CreatedOrder, CreatedProduct, LinkedSession, ProductLine, SessionMetadata,
    SessionRequest, StartedSession,
};
use crate::order::order_total;

/// Prefix the API puts on session ids it hands out
pub const SESSION_ID_PREFIX: &str = "sess_";

/// Separator between product names in a combined session name
pub const NAME_SEPARATOR: &str = " + ";

/// Session creation answers 200, never 201
pub const SESSION_OK: [u16; 1] = [200];
pub const LINK_OK: [u16; 1] = [200];

/// Canonical session id: leading `sess_` removed
///
/// Idempotent: `normalize_session_id(normalize_session_id(x)) == normalize_session_id(x)`.
pub fn normalize_session_id(id: &str) -> &str {
    id.trim_start_matches(SESSION_ID_PREFIX)
}

/// Product names joined by `" + "`
pub fn combined_name(products: &[CreatedProduct]) -> String {
    products
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Per-run session settings
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub success_url: String,
    pub cancel_url: String,

    /// Prepended to the session name on the wire (e.g., "WooCommerce Order: ")
    pub name_prefix: Option<String>,

    /// Recorded as `metadata.source`
    pub source: String,
}

impl SessionOptions {
    pub fn new(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            name_prefix: None,
            source: "woocommerce_plugin".into(),
        }
    }
}

pub struct SessionLinker {
    api: Arc<dyn CommerceApi>,
    options: SessionOptions,
}

impl SessionLinker {
    pub fn new(api: Arc<dyn CommerceApi>, options: SessionOptions) -> Self {
        Self { api, options }
    }

    /// Session body describing the whole purchase
    pub fn build_request(&self, order: &CreatedOrder, products: &[CreatedProduct]) -> SessionRequest {
        let combined = combined_name(products);
        let names: Vec<String> = products.iter().map(|p| p.name.clone()).collect();
        let total = order_total(products);

        let details = if products.len() == 1 {
            format!("Payment for {combined}")
        } else {
            format!("Payment for order containing: {}", names.join(", "))
        };

        let name = match &self.options.name_prefix {
            Some(prefix) => format!("{prefix}{combined}"),
            None => combined,
        };

        SessionRequest {
            name,
            details,
            currency: order.currency.clone(),
            amount: total,
            recurring: false,
            success_url: self.options.success_url.clone(),
            cancel_url: self.options.cancel_url.clone(),
            metadata: SessionMetadata {
                woocommerce_order_id: order.id.clone(),
                source: self.options.source.clone(),
                product_count: products.len(),
                individual_products: names,
                total_items: products.len(),
                products: products.iter().map(ProductLine::from).collect(),
                total_amount: total,
                currency: order.currency.clone(),
            },
        }
    }

    /// Phase A: create the purchase session
    pub async fn start(&self, request: &SessionRequest) -> Result<StartedSession> {
        let phase = Phase::Session;

        tracing::info!(name = %request.name, amount = %request.amount, "Creating purchase session");

        let response = dispatch(self.api.as_ref(), &Endpoint::StartSession, Some(request), &phase)
            .await?
            .ensure_status(&SESSION_OK, &phase)?;

        let body = response.parse::<Value>(&phase)?;
        let data = body
            .get("data")
            .filter(|d| d.is_object())
            .ok_or_else(|| response.missing(&phase, "data"))?;

        let original_id = data
            .get("purchase_session_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| response.missing(&phase, "data.purchase_session_id"))?;
        let checkout_url = data.get("url").and_then(Value::as_str).map(str::to_string);

        let purchase_session_id = normalize_session_id(&original_id).to_string();
        if purchase_session_id.is_empty() {
            return Err(response.missing(&phase, "data.purchase_session_id"));
        }
        if purchase_session_id != original_id {
            tracing::debug!(original = %original_id, canonical = %purchase_session_id, "Stripped session id prefix");
        }

        tracing::info!(
            purchase_session_id = %purchase_session_id,
            checkout_url = ?checkout_url,
            "Purchase session created"
        );

        Ok(StartedSession {
            original_id,
            purchase_session_id,
            checkout_url,
        })
    }

    /// Phase B: point the order's checkout at the session
    pub async fn link(&self, order_id: &str, session: &StartedSession) -> Result<()> {
        let phase = Phase::Link;
        let endpoint = Endpoint::LinkCheckout { order_id: order_id.to_string() };
        let body = CheckoutLink {
            purchase_session_id: normalize_session_id(&session.purchase_session_id).to_string(),
        };

        tracing::info!(order_id, purchase_session_id = %body.purchase_session_id, "Linking order to purchase session");

        dispatch(self.api.as_ref(), &endpoint, Some(&body), &phase)
            .await?
            .ensure_status(&LINK_OK, &phase)?;

        tracing::info!(order_id, "Order linked to purchase session");
        Ok(())
    }

    /// Create the session and link it; the link is only sent once a
    /// canonical id is in hand
    pub async fn start_and_link(
        &self,
        order: &CreatedOrder,
        products: &[CreatedProduct],
    ) -> Result<LinkedSession> {
        let request = self.build_request(order, products);
        let started = self.start(&request).await?;
        self.link(&order.id, &started).await?;

        Ok(LinkedSession {
            purchase_session_id: started.purchase_session_id,
            checkout_url: started.checkout_url,
            original_id: started.original_id,
            combined_name: combined_name(products),
            total_amount: request.metadata.total_amount,
            product_count: request.metadata.product_count,
        })
    }

    /// Look up a session's status; the parsed body is returned untouched
    pub async fn status(&self, session_id: &str) -> Result<Value> {
        let phase = Phase::Status;
        let endpoint = Endpoint::SessionStatus {
            session_id: normalize_session_id(session_id).to_string(),
        };

        let response = dispatch::<()>(self.api.as_ref(), &endpoint, None, &phase)
            .await?
            .ensure_status(&SESSION_OK, &phase)?;

        response.parse(&phase)
    }
}

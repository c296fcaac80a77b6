//! Order Creation

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::api::{CommerceApi, Endpoint, dispatch};
use crate::error::{CheckoutError, Phase, Result};
use crate::model::{CreatedOrder, CreatedProduct, Metadata, OrderItem, OrderRequest};
use crate::product::top_level_id;

pub const ORDER_OK: [u16; 2] = [200, 201];

/// Exact sum of unit prices
pub fn order_total(products: &[CreatedProduct]) -> Decimal {
    products.iter().map(|p| p.price).sum()
}

/// Build the order body: one item per product, quantity 1
pub fn build_order(products: &[CreatedProduct], currency: &str, metadata: Metadata) -> OrderRequest {
    let items: Vec<OrderItem> = products
        .iter()
        .map(|p| OrderItem {
            product_id: p.id.clone(),
            quantity: 1,
            price: p.price,
        })
        .collect();

    OrderRequest {
        total: items.iter().map(OrderItem::line_total).sum(),
        currency: currency.to_string(),
        items,
        metadata,
    }
}

pub struct OrderBuilder {
    api: Arc<dyn CommerceApi>,
    currency: String,
}

impl OrderBuilder {
    pub fn new(api: Arc<dyn CommerceApi>, currency: impl Into<String>) -> Self {
        Self { api, currency: currency.into() }
    }

    /// Submit an order referencing every product
    pub async fn submit(&self, products: &[CreatedProduct], metadata: Metadata) -> Result<CreatedOrder> {
        if products.is_empty() {
            return Err(CheckoutError::InvalidInput("an order needs at least one product".into()));
        }

        let phase = Phase::Order;
        let request = build_order(products, &self.currency, metadata);

        tracing::info!(
            total = %request.total,
            currency = %request.currency,
            items = request.items.len(),
            "Creating order"
        );

        let response = dispatch(self.api.as_ref(), &Endpoint::CreateOrder, Some(&request), &phase)
            .await?
            .ensure_status(&ORDER_OK, &phase)?;

        let id = top_level_id(&response.parse::<serde_json::Value>(&phase)?)
            .ok_or_else(|| response.missing(&phase, "id"))?;

        tracing::info!(order_id = %id, "Order created");

        Ok(CreatedOrder {
            id,
            total: request.total,
            currency: request.currency,
            item_count: request.items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockCommerceApi, RawResponse};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product(id: &str, price: Decimal) -> CreatedProduct {
        CreatedProduct { id: id.into(), name: format!("Product {id}"), price }
    }

    #[test]
    fn test_total_is_exact() {
        let products = [product("a", dec!(0.01)), product("b", dec!(0.02))];
        assert_eq!(order_total(&products), dec!(0.03));

        let many: Vec<_> = (0..10).map(|i| product(&i.to_string(), dec!(0.1))).collect();
        assert_eq!(order_total(&many), dec!(1.0));
    }

    #[test]
    fn test_build_order_items() {
        let products = [product("a", dec!(25.99)), product("b", dec!(0.01))];
        let order = build_order(&products, "USD", Metadata::new());

        assert_eq!(order.total, dec!(26.00));
        assert_eq!(order.items.len(), 2);
        assert!(order.items.iter().all(|i| i.quantity == 1));
        assert_eq!(order.items[0].product_id, "a");
        assert_eq!(order.items[1].price, dec!(0.01));
    }

    #[tokio::test]
    async fn test_submit_sends_numeric_total() {
        let mock = Arc::new(MockCommerceApi::with_responses([RawResponse::json(
            201,
            &json!({"id": "ord-1", "status": "pending"}),
        )]));
        let builder = OrderBuilder::new(mock.clone(), "USD");

        let mut metadata = Metadata::new();
        metadata.insert("customer_email".into(), json!("test@example.com"));
        let products = [product("a", dec!(0.01)), product("b", dec!(0.02))];

        let order = builder.submit(&products, metadata).await.unwrap();
        assert_eq!(order.id, "ord-1");
        assert_eq!(order.total, dec!(0.03));
        assert_eq!(order.item_count, 2);

        let calls = mock.calls().await;
        assert_eq!(calls[0].endpoint, Endpoint::CreateOrder);
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["total"], json!(0.03));
        assert_eq!(body["items"][1]["product_id"], "b");
        assert_eq!(body["items"][1]["quantity"], 1);
        assert_eq!(body["metadata"]["customer_email"], "test@example.com");
    }

    #[tokio::test]
    async fn test_empty_order_rejected() {
        let mock = Arc::new(MockCommerceApi::new());
        let builder = OrderBuilder::new(mock.clone(), "USD");

        let err = builder.submit(&[], Metadata::new()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidInput(_)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_rejected_status() {
        let mock = Arc::new(MockCommerceApi::with_responses([RawResponse::new(
            500,
            "internal error",
        )]));
        let builder = OrderBuilder::new(mock, "USD");

        let err = builder
            .submit(&[product("a", dec!(1))], Metadata::new())
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(&Phase::Order));
        assert_eq!(err.response_body(), Some("internal error"));
    }

    #[tokio::test]
    async fn test_order_without_object_body_is_missing_id() {
        for body in [json!({"order": {"id": "ord-1"}}), json!("ord-1"), json!([])] {
            let mock = Arc::new(MockCommerceApi::with_responses([RawResponse::json(201, &body)]));
            let builder = OrderBuilder::new(mock, "USD");

            let err = builder
                .submit(&[product("a", dec!(1))], Metadata::new())
                .await
                .unwrap_err();
            assert!(
                matches!(err, CheckoutError::MissingField { phase: Phase::Order, field: "id", .. }),
                "{body} gave {err:?}"
            );
        }
    }
}

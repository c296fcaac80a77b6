//! Sample Data
//!
//! The products, order metadata, and webhook event the probe submits. Prices
//! are deliberately tiny so a completed test payment costs cents.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use crate::model::{Metadata, ProductDraft, ProductLine};
use crate::webhook::{PaymentWebhook, TransactionDetails, WebhookMetadata, WebhookUser};

pub const CURRENCY: &str = "USD";

/// Product used by the connection check
pub fn connection_test_product() -> ProductDraft {
    ProductDraft::new("API Connection Test", dec!(1.00), CURRENCY)
}

/// One product for the single-item flow
pub fn single_product() -> Vec<ProductDraft> {
    vec![
        ProductDraft::new("Test WooCommerce Product", dec!(25.99), CURRENCY)
            .with_description("A test product created from WooCommerce integration")
            .with_image_url("https://via.placeholder.com/300x300")
            .with_metadata("woocommerce_product_id", "12345")
            .with_metadata("sku", "TEST-SKU-001")
            .with_metadata("type", "simple"),
    ]
}

/// Two products for the multi-item flow
pub fn multi_products() -> Vec<ProductDraft> {
    vec![
        ProductDraft::new("Premium T-Shirt", dec!(0.01), CURRENCY)
            .with_description("High-quality cotton t-shirt")
            .with_image_url("https://via.placeholder.com/300x300?text=T-Shirt")
            .with_metadata("woocommerce_product_id", "1001")
            .with_metadata("sku", "TSHIRT-001")
            .with_metadata("type", "simple")
            .with_metadata("category", "clothing"),
        ProductDraft::new("Wireless Headphones", dec!(0.02), CURRENCY)
            .with_description("Noise-cancelling wireless headphones")
            .with_image_url("https://via.placeholder.com/300x300?text=Headphones")
            .with_metadata("woocommerce_product_id", "1002")
            .with_metadata("sku", "HEADPHONES-001")
            .with_metadata("type", "simple")
            .with_metadata("category", "electronics"),
    ]
}

/// Order metadata; `order_type` is only set for the multi-item flow
pub fn order_metadata(external_order_id: &str, order_type: Option<&str>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("woocommerce_order_id".into(), json!(external_order_id));
    metadata.insert("customer_email".into(), json!("test@example.com"));
    if let Some(order_type) = order_type {
        metadata.insert("order_type".into(), json!(order_type));
    }
    metadata
}

fn timestamp(secs: i64, micros: u32) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, micros * 1_000)
        .single()
        .unwrap_or_default()
}

/// A completed two-item payment, as the receiver would get it
pub fn sample_payment_webhook() -> PaymentWebhook {
    PaymentWebhook {
        event_type: "payment".into(),
        merchant_id: "mrch_ca875a80-9b10-40ce-85c0-5af81856733a".into(),
        origin_id: "sess_0b3863d2-e5d5-4738-9135-a9a43c27e5b1".into(),
        origin: "purchase_sessions".into(),
        name: "WooCommerce Order: Premium T-Shirt + Wireless Headphones".into(),
        currency: "USDC".into(),
        amount: dec!(0.03),
        metadata: WebhookMetadata {
            currency: CURRENCY.into(),
            individual_products: vec!["Premium T-Shirt".into(), "Wireless Headphones".into()],
            product_count: 2,
            products: vec![
                ProductLine {
                    id: "bdca0f1f-6c14-4ffe-b8c7-b64f2ca7d94d".into(),
                    name: "Premium T-Shirt".into(),
                    price: dec!(0.01),
                },
                ProductLine {
                    id: "bae95db1-46e1-4fd0-8f8b-a7c929e143ec".into(),
                    name: "Wireless Headphones".into(),
                    price: dec!(0.02),
                },
            ],
            source: "woocommerce_plugin".into(),
            total_amount: dec!(0.03),
            total_items: 2,
            woocommerce_order_id: "c53e29df-6a01-4fd4-a697-98c398c143f9".into(),
        },
        // 2025-10-03T15:33:59.914390Z / 2025-10-03T15:36:37.232596Z
        payment_date: timestamp(1_759_505_639, 914_390),
        last_updated: timestamp(1_759_505_797, 232_596),
        status: "completed".into(),
        transaction_details: TransactionDetails {
            transaction_id: 14415,
            transaction_hash: "0x7a33e5708ea9dac1c9d26ca8cab586b7759fa7a1199f3918e6662524d45f336d".into(),
            chain_id: 80002,
        },
        user: WebhookUser {
            first_name: "Test".into(),
            last_name: "Customer".into(),
            email: "test@example.com".into(),
            subscriber_id: "2d8aa67e-add5-4b7f-902f-a6d09f23270f".into(),
        },
        payment_id: "paym_50fb734f-5325-4482-b9a9-463339817c23".into(),
        agreement_id: "agre_36b3d327-78d6-4338-817b-2921275434de".into(),
    }
}

//! Domain Models
//!
//! Request and response shapes for the commerce API. Money is always
//! `rust_decimal::Decimal`; it goes over the wire as a JSON number because
//! that is what the API accepts, but it is never added up as `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form key/value metadata attached to API entities
pub type Metadata = HashMap<String, serde_json::Value>;

/// A product to be created in the commerce catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Display name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unit price, must be strictly positive
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// ISO currency code (e.g., "USD")
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// External catalog id, SKU, ...
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, price: Decimal, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            currency: currency.into(),
            image_url: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A product the API has accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProduct {
    /// Identifier assigned by the commerce API
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

/// One line of an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,

    /// Unit price snapshot at order time
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl OrderItem {
    /// Line total (price × quantity)
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Body of `POST /commerce/orders`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub currency: String,
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// An order the API has accepted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    pub total: Decimal,
    pub currency: String,
    pub item_count: usize,
}

/// Per-product detail embedded in session metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLine {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&CreatedProduct> for ProductLine {
    fn from(product: &CreatedProduct) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
        }
    }
}

/// Structured metadata sent with a purchase session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub woocommerce_order_id: String,
    pub source: String,
    pub product_count: usize,
    pub individual_products: Vec<String>,
    pub total_items: usize,
    pub products: Vec<ProductLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: String,
}

/// Body of `POST /purchase/session/start`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub name: String,
    pub details: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub recurring: bool,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: SessionMetadata,
}

/// Body of `PUT /commerce/orders/{id}/checkout`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLink {
    pub purchase_session_id: String,
}

/// A purchase session created but not yet linked to its order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartedSession {
    /// Identifier exactly as returned by the API
    pub original_id: String,

    /// Canonical identifier used for linking
    pub purchase_session_id: String,

    pub checkout_url: Option<String>,
}

/// A purchase session linked to its order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedSession {
    /// Canonical (unprefixed) identifier
    pub purchase_session_id: String,

    /// Where the customer completes payment
    pub checkout_url: Option<String>,

    /// Identifier as returned before normalization
    pub original_id: String,

    /// Product names joined by " + "
    pub combined_name: String,

    pub total_amount: Decimal,
    pub product_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_draft_serializes_price_as_number() {
        let draft = ProductDraft::new("Premium T-Shirt", dec!(0.01), "USD")
            .with_metadata("sku", "TSHIRT-001");

        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["price"], serde_json::json!(0.01));
        assert_eq!(value["metadata"]["sku"], "TSHIRT-001");
        assert!(value.get("description").is_none());
        assert!(value.get("image_url").is_none());
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            product_id: "p1".into(),
            quantity: 3,
            price: dec!(25.99),
        };
        assert_eq!(item.line_total(), dec!(77.97));
    }
}

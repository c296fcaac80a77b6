//! Product Creation
//!
//! Submits product drafts one at a time, in order. The first failure stops
//! the run; nothing is retried.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::api::{CommerceApi, Endpoint, dispatch};
use crate::error::{CheckoutError, Phase, Result};
use crate::model::{CreatedProduct, ProductDraft};

/// Statuses the products endpoint answers with on success
pub const PRODUCT_OK: [u16; 2] = [200, 201];

/// Top-level `id` of a product or order response
///
/// Numeric ids are stringified. Any other shape, including a body that is
/// not an object, yields `None`.
pub(crate) fn top_level_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ProductCreator {
    api: Arc<dyn CommerceApi>,
}

impl ProductCreator {
    pub fn new(api: Arc<dyn CommerceApi>) -> Self {
        Self { api }
    }

    /// Create a single product; `index` is its 1-based position in the run
    pub async fn create(&self, index: usize, draft: &ProductDraft) -> Result<CreatedProduct> {
        let phase = Phase::Product { index, name: draft.name.clone() };

        if draft.price <= Decimal::ZERO {
            return Err(CheckoutError::InvalidInput(format!(
                "{phase}: price must be positive, got {}",
                draft.price
            )));
        }

        tracing::info!(index, name = %draft.name, price = %draft.price, currency = %draft.currency, "Creating product");

        let response = dispatch(self.api.as_ref(), &Endpoint::CreateProduct, Some(draft), &phase)
            .await?
            .ensure_status(&PRODUCT_OK, &phase)?;

        let id = top_level_id(&response.parse::<Value>(&phase)?)
            .ok_or_else(|| response.missing(&phase, "id"))?;

        tracing::info!(index, product_id = %id, "Product created");

        Ok(CreatedProduct {
            id,
            name: draft.name.clone(),
            price: draft.price,
        })
    }

    /// Create every draft in order, stopping at the first failure
    pub async fn create_all(&self, drafts: &[ProductDraft]) -> Result<Vec<CreatedProduct>> {
        let mut created = Vec::with_capacity(drafts.len());
        for (i, draft) in drafts.iter().enumerate() {
            created.push(self.create(i + 1, draft).await?);
        }
        Ok(created)
    }
}

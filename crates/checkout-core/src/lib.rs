//! # checkout-core
//!
//! Checkout workflow against the commerce API, plus a webhook probe.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────────┐   ┌──────────┐   ┌──────────┐
//! │ Products │──▶│  Order  │──▶│ Purchase      │──▶│ Checkout │──▶│  Verify  │
//! │ (1..n)   │   │ (Σ px)  │   │ session       │   │ link     │   │ (multi)  │
//! └──────────┘   └─────────┘   └───────────────┘   └──────────┘   └──────────┘
//! ```
//!
//! Every phase needs the previous phase's output, so the run is strictly
//! sequential and the first failure ends it. The session id the API returns
//! may carry a `sess_` prefix; only the bare id is used for linking.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use checkout_core::{CheckoutWorkflow, HttpCommerceClient, ProbeConfig, fixtures};
//!
//! let config = ProbeConfig::from_env()?;
//! let api = Arc::new(HttpCommerceClient::new(&config)?);
//! let workflow = CheckoutWorkflow::from_config(api, &config);
//!
//! let report = workflow.run_multi(&fixtures::multi_products()).await?;
//! println!("pay at {:?}", report.session.checkout_url);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod order;
pub mod product;
pub mod session;
pub mod verify;
pub mod webhook;
pub mod workflow;

pub use api::{CommerceApi, Endpoint, HttpCommerceClient, MockCommerceApi, RawResponse};
pub use config::ProbeConfig;
pub use error::{CheckoutError, Phase, Result};
pub use model::{CreatedOrder, CreatedProduct, LinkedSession, ProductDraft};
pub use order::OrderBuilder;
pub use product::ProductCreator;
pub use session::{SessionLinker, SessionOptions, normalize_session_id};
pub use verify::{VerificationReport, verify_session};
pub use webhook::{PaymentWebhook, ProbeOutcome, WebhookProbe};
pub use workflow::{CheckoutReport, CheckoutWorkflow, FlowKind};

//! checkout-probe
//!
//! Drives the commerce checkout flow against a live API, fires a sample
//! payment webhook, or runs a local receiver that logs incoming webhooks.

mod receiver;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{
    CheckoutError, CheckoutReport, CheckoutWorkflow, HttpCommerceClient, ProbeConfig,
    WebhookProbe, config::DEFAULT_WEBHOOK_TIMEOUT, fixtures,
};

use crate::state::ReceiverState;

#[derive(Parser)]
#[command(name = "checkout-probe", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One product, one order, one checkout link
    Single {
        /// Skip the API connection check
        #[arg(long)]
        skip_preflight: bool,
    },

    /// Two products combined into one order and session, then verified
    Multi {
        /// Skip the API connection check
        #[arg(long)]
        skip_preflight: bool,
    },

    /// POST a sample payment webhook to a receiver
    Webhook {
        #[arg(long, env = "WEBHOOK_URL")]
        url: String,

        /// Sign the body with this secret
        #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Fetch the status of a purchase session
    Status {
        /// Session id, with or without the `sess_` prefix
        session_id: String,
    },

    /// Run a local receiver that logs every webhook it gets
    Listen {
        #[arg(long, env = "WEBHOOK_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,

        /// Check `X-CoinSub-Signature` against this secret
        #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Single { skip_preflight } => {
            let workflow = workflow_from_env()?;
            preflight(&workflow, skip_preflight).await?;
            let draft = fixtures::single_product().remove(0);
            let report = workflow.run_single(draft).await.map_err(report_failure)?;
            finish(&report)
        }
        Command::Multi { skip_preflight } => {
            let workflow = workflow_from_env()?;
            preflight(&workflow, skip_preflight).await?;
            let report = workflow
                .run_multi(&fixtures::multi_products())
                .await
                .map_err(report_failure)?;
            finish(&report)
        }
        Command::Webhook { url, secret } => send_webhook(url, secret).await,
        Command::Status { session_id } => {
            let workflow = workflow_from_env()?;
            let status = workflow
                .sessions()
                .status(&session_id)
                .await
                .map_err(report_failure)?;
            tracing::info!("Session status:\n{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Listen { addr, secret } => listen(&addr, secret).await,
    }
}

fn workflow_from_env() -> anyhow::Result<CheckoutWorkflow> {
    let config = ProbeConfig::from_env().context("Loading probe configuration")?;
    config.log_summary();

    let api = Arc::new(HttpCommerceClient::new(&config)?);
    Ok(CheckoutWorkflow::from_config(api, &config))
}

async fn preflight(workflow: &CheckoutWorkflow, skip: bool) -> anyhow::Result<()> {
    if skip {
        tracing::info!("Skipping API connection check");
        return Ok(());
    }
    workflow.check_connection().await.map_err(report_failure)
}

/// Log the failed phase and whatever the API answered
fn report_failure(err: CheckoutError) -> anyhow::Error {
    match err.phase() {
        Some(phase) => tracing::error!(%phase, "✗ {}", err),
        None => tracing::error!("✗ {}", err),
    }
    if let Some(body) = err.response_body() {
        tracing::error!("  Response: {}", body);
    }
    err.into()
}

fn finish(report: &CheckoutReport) -> anyhow::Result<()> {
    report.log_summary();
    if !report.verified() {
        tracing::warn!("⚠ Checkout completed but verification found mismatches");
    }
    Ok(())
}

async fn send_webhook(url: String, secret: Option<String>) -> anyhow::Result<()> {
    let mut probe = WebhookProbe::new(url, DEFAULT_WEBHOOK_TIMEOUT)?;
    if let Some(secret) = secret {
        probe = probe.with_secret(secret);
    }

    let outcome = probe
        .send(&fixtures::sample_payment_webhook())
        .await
        .map_err(report_failure)?;
    tracing::info!(status = outcome.status, "Receiver response: {}", outcome.body);

    if !probe.reachable().await {
        tracing::warn!("⚠ Webhook endpoint did not answer GET with 200");
    }

    anyhow::ensure!(
        outcome.accepted(),
        "webhook receiver answered {} instead of 200",
        outcome.status
    );
    tracing::info!("✓ Webhook delivered to {}", probe.url());
    Ok(())
}

async fn listen(addr: &str, secret: Option<String>) -> anyhow::Result<()> {
    let signing = secret.is_some();
    let app = receiver::router(ReceiverState::new(secret));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding {addr}"))?;
    tracing::info!(signature_check = signing, "🚀 Webhook receiver listening on http://{}", listener.local_addr()?);
    tracing::info!("  POST /webhook or / to log an event");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down receiver");
        })
        .await?;

    Ok(())
}
